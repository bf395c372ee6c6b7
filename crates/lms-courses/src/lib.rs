//! # lms-courses: Course Catalogue
//!
//! Course creation by an authenticated author and public, filtered
//! listings. Courses share the [`Datastore`] with certificates but nothing
//! else; the two features are independent.

use lms_core::{AuthorId, Clock, CourseDraft, CourseId, CourseQuery, CourseRecord, ValidationError};
use lms_store::schema::courses;
use lms_store::{from_row, to_row, Datastore, Filter, Selection, StoreError};

/// Course operation failure.
#[derive(Debug, thiserror::Error)]
pub enum CourseError {
    #[error("User not authenticated")]
    Unauthenticated,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("course store failure: {0}")]
    Persistence(#[from] StoreError),

    #[error("Course created but no data returned")]
    EmptyResult,
}

impl CourseError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::EmptyResult => "EMPTY_RESULT",
        }
    }
}

/// Create a course authored by `author`.
///
/// Fails with [`CourseError::Unauthenticated`] before anything else when
/// there is no author.
pub async fn create_course<D: Datastore + ?Sized>(
    store: &D,
    clock: &dyn Clock,
    author: Option<&AuthorId>,
    draft: &CourseDraft,
) -> Result<CourseRecord, CourseError> {
    let author = author.ok_or(CourseError::Unauthenticated)?;
    let fields = draft.validate()?;

    let record = fields.into_record(CourseId::new(), author.clone(), clock.now());
    let row = to_row(courses::TABLE, &record)?;
    let persisted = match store.insert(courses::TABLE, row).await {
        Ok(row) => row,
        Err(StoreError::NoRowReturned { .. }) => return Err(CourseError::EmptyResult),
        Err(err) => {
            tracing::warn!(error = %err, "course insert failed");
            return Err(err.into());
        }
    };
    let created: CourseRecord = from_row(courses::TABLE, persisted)?;
    tracing::info!(course = %created.id, subject = %created.subject, "course created");
    Ok(created)
}

/// List courses matching `query`, newest first.
pub async fn list_courses<D: Datastore + ?Sized>(
    store: &D,
    query: &CourseQuery,
) -> Result<Vec<CourseRecord>, CourseError> {
    let selection = selection_for(query);
    let rows = store.select(courses::TABLE, &selection).await?;
    tracing::debug!(count = rows.len(), offset = selection.offset, "courses listed");
    rows.into_iter()
        .map(|row| from_row(courses::TABLE, row).map_err(CourseError::from))
        .collect()
}

fn selection_for(query: &CourseQuery) -> Selection {
    let mut filter = Filter::new();
    if let Some(subject) = query.subject {
        filter = filter.eq(courses::SUBJECT, subject.as_str());
    }
    if let Some(topic) = query.topic_filter() {
        filter = filter.eq(courses::TOPIC, topic);
    }
    Selection {
        filter,
        order_by: Some(courses::CREATED_AT.to_string()),
        descending: true,
        limit: Some(query.page_size()),
        offset: query.offset(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::Subject;

    #[test]
    fn selection_pages_newest_first() {
        let query = CourseQuery {
            limit: Some(5),
            page: Some(3),
            subject: Some(Subject::GeneralSkills),
            topic: Some("  ".into()),
        };
        let selection = selection_for(&query);
        assert_eq!(selection.limit, Some(5));
        assert_eq!(selection.offset, 10);
        assert!(selection.descending);
        assert_eq!(selection.order_by.as_deref(), Some("created_at"));
        let conditions: Vec<_> = selection.filter.conditions().map(|(c, _)| c.to_string()).collect();
        assert_eq!(conditions, vec!["subject"]);
    }

    #[test]
    fn unauthenticated_message() {
        assert_eq!(CourseError::Unauthenticated.to_string(), "User not authenticated");
        assert_eq!(
            CourseError::EmptyResult.to_string(),
            "Course created but no data returned"
        );
    }
}
