//! Offered courses and certificate types.
//!
//! These populate the issuance form pickers. They are suggestions, not a
//! whitelist: issuance accepts any non-blank course name and type.

use serde::Serialize;

use crate::course::Subject;

/// Course names certificates are currently issued for.
pub const OFFERED_COURSES: [&str; 5] = [
    "Python Course LM6E",
    "Cyber Security Course LM6E",
    "Web Development Course LM6E",
    "Content Creation Course LM6E",
    "CodeCadet Event",
];

/// Certificate types offered by the issuance form.
pub const CERTIFICATE_TYPES: [&str; 4] = [
    "Completion",
    "Achievement",
    "Excellence",
    "Mentorship Excellence Certificate",
];

/// One subject entry in the catalogue.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectEntry {
    pub id: Subject,
    pub name: &'static str,
    pub color: &'static str,
}

/// Everything a submission form needs to render its pickers.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub courses: Vec<&'static str>,
    pub certificate_types: Vec<&'static str>,
    pub subjects: Vec<SubjectEntry>,
}

pub fn catalog() -> Catalog {
    Catalog {
        courses: OFFERED_COURSES.to_vec(),
        certificate_types: CERTIFICATE_TYPES.to_vec(),
        subjects: Subject::ALL
            .into_iter()
            .map(|s| SubjectEntry {
                id: s,
                name: s.display_name(),
                color: s.color(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_subject() {
        let c = catalog();
        assert_eq!(c.subjects.len(), Subject::ALL.len());
        assert!(c.courses.contains(&"CodeCadet Event"));
        assert_eq!(c.certificate_types[0], "Completion");
    }
}
