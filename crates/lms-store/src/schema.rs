//! Table and column names shared by the backends, the migrations, and the
//! typed record layers above this crate.

/// The `certificates` table.
pub mod certificates {
    pub const TABLE: &str = "certificates";

    pub const KEY: &str = "certificate_key";
    pub const STUDENT_NAME: &str = "student_name";
    pub const COURSE_NAME: &str = "course_name";
    pub const CERTIFICATE_TYPE: &str = "certificate_type";
    pub const DATE_AWARDED: &str = "date_awarded";
    pub const CREATED_AT: &str = "created_at";

    /// Columns of the duplicate tuple.
    pub const TUPLE: [&str; 4] = [STUDENT_NAME, COURSE_NAME, CERTIFICATE_TYPE, DATE_AWARDED];

    pub const TUPLE_CONSTRAINT: &str = "certificates_tuple_key";
    pub const KEY_CONSTRAINT: &str = "certificates_pkey";
}

/// The `courses` table.
pub mod courses {
    pub const TABLE: &str = "courses";

    pub const ID: &str = "id";
    pub const SUBJECT: &str = "subject";
    pub const TOPIC: &str = "topic";
    pub const AUTHOR: &str = "author";
    pub const CREATED_AT: &str = "created_at";

    pub const KEY_CONSTRAINT: &str = "courses_pkey";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_identifier;

    #[test]
    fn every_name_is_a_valid_identifier() {
        for name in [certificates::TABLE, certificates::KEY, certificates::CREATED_AT, courses::TABLE, courses::ID]
            .into_iter()
            .chain(certificates::TUPLE)
        {
            assert!(validate_identifier(name).is_ok(), "{name}");
        }
    }
}
