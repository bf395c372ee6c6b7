//! # Course Records
//!
//! Courses are authored by signed-in users through the course builder and
//! listed on the catalogue pages. A course carries a subject from a closed
//! set, a free-text topic, and a duration in minutes.

use serde::{Deserialize, Serialize};

use crate::error::{Field, ValidationError};
use crate::identity::{AuthorId, CourseId};
use crate::temporal::Timestamp;

/// Longest course a builder may declare, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// Default page size for course listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size a listing may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Course subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subject {
    Cpp,
    Python,
    Cybersecurity,
    Cryptography,
    Webdev,
    GeneralSkills,
}

impl Subject {
    /// Every subject, in catalogue order.
    pub const ALL: [Subject; 6] = [
        Self::Cpp,
        Self::Python,
        Self::Cybersecurity,
        Self::Cryptography,
        Self::Webdev,
        Self::GeneralSkills,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpp => "cpp",
            Self::Python => "python",
            Self::Cybersecurity => "cybersecurity",
            Self::Cryptography => "cryptography",
            Self::Webdev => "webdev",
            Self::GeneralSkills => "general-skills",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Cpp => "C++",
            Self::Python => "Python",
            Self::Cybersecurity => "Cyber Security",
            Self::Cryptography => "Cryptography",
            Self::Webdev => "Web Development",
            Self::GeneralSkills => "General Skills",
        }
    }

    /// Badge colour used by course cards.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Cpp => "#BDE7FF",
            Self::Python => "#FFDA6E",
            Self::Cybersecurity => "#E5D0FF",
            Self::Cryptography => "#FFECC8",
            Self::Webdev => "#FFC8E4",
            Self::GeneralSkills => "#e89d0c",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Subject {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|subject| subject.as_str() == needle || (needle == "generalskills" && *subject == Self::GeneralSkills))
            .ok_or_else(|| ValidationError::OutOfRange {
                field: Field::Subject,
                reason: format!("{s:?} is not a known subject"),
            })
    }
}

/// Raw course-builder input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub topic: String,
    /// Minutes.
    #[serde(default)]
    pub duration: u32,
}

impl CourseDraft {
    /// Validate in field order: name, subject, topic, duration.
    pub fn validate(&self) -> Result<CourseFields, ValidationError> {
        let name = non_blank(&self.name, Field::Name)?;
        if self.subject.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: Field::Subject,
            });
        }
        let subject = self.subject.parse::<Subject>()?;
        let topic = non_blank(&self.topic, Field::Topic)?;
        if self.duration == 0 || self.duration > MAX_DURATION_MINUTES {
            return Err(ValidationError::OutOfRange {
                field: Field::Duration,
                reason: format!("must be between 1 and {MAX_DURATION_MINUTES} minutes"),
            });
        }
        Ok(CourseFields {
            name,
            subject,
            topic,
            duration: self.duration,
        })
    }
}

fn non_blank(value: &str, field: Field) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField { field })
    } else {
        Ok(trimmed.to_string())
    }
}

/// Validated course-builder input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFields {
    pub name: String,
    pub subject: Subject,
    pub topic: String,
    pub duration: u32,
}

impl CourseFields {
    pub fn into_record(self, id: CourseId, author: AuthorId, created_at: Timestamp) -> CourseRecord {
        CourseRecord {
            id,
            name: self.name,
            subject: self.subject,
            topic: self.topic,
            duration: self.duration,
            author,
            created_at,
        }
    }
}

/// A persisted course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: CourseId,
    pub name: String,
    pub subject: Subject,
    pub topic: String,
    pub duration: u32,
    pub author: AuthorId,
    pub created_at: Timestamp,
}

/// Course listing parameters. `page` is 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseQuery {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub subject: Option<Subject>,
    #[serde(default)]
    pub topic: Option<String>,
}

impl CourseQuery {
    /// Page size after defaulting and clamping to `1..=MAX_PAGE_SIZE`.
    pub fn page_size(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows to skip for the requested page.
    pub fn offset(&self) -> u64 {
        let page = self.page.unwrap_or(1).max(1);
        u64::from(page - 1) * u64::from(self.page_size())
    }

    /// Topic filter, if one was given and is not blank.
    pub fn topic_filter(&self) -> Option<&str> {
        self.topic.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}
