//! # Validation Errors
//!
//! Input validation failures detected locally, before any datastore call.
//! All errors use `thiserror` for derive-based `Display` and `Error`.
//!
//! Every variant identifies the failing [`Field`] so callers can highlight
//! it. Display messages use the same wording the submission forms show.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named input field that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    StudentName,
    CourseName,
    CertificateType,
    DateAwarded,
    CertificateKey,
    Name,
    Subject,
    Topic,
    Duration,
    Author,
}

impl Field {
    /// Wire name of the field, as used in request bodies and storage columns.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StudentName => "student_name",
            Self::CourseName => "course_name",
            Self::CertificateType => "certificate_type",
            Self::DateAwarded => "date_awarded",
            Self::CertificateKey => "certificate_key",
            Self::Name => "name",
            Self::Subject => "subject",
            Self::Topic => "topic",
            Self::Duration => "duration",
            Self::Author => "author",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::StudentName => "Student name",
            Self::CourseName => "Course name",
            Self::CertificateType => "Certificate type",
            Self::DateAwarded => "Date of awarding",
            Self::CertificateKey => "Certificate key",
            Self::Name => "Name",
            Self::Subject => "Subject",
            Self::Topic => "Topic",
            Self::Duration => "Duration",
            Self::Author => "Author",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Input rejected before reaching the datastore.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or blank after trimming.
    #[error("{field} is required")]
    MissingField { field: Field },

    /// A date field did not parse as a calendar date.
    #[error("{field} is not a valid date: {value:?}")]
    InvalidDate { field: Field, value: String },

    /// The award date lies after the current date.
    #[error("Date of awarding cannot be in the future ({date} is after {today})")]
    FutureDate { date: NaiveDate, today: NaiveDate },

    /// A certificate key lookup was requested with blank input.
    #[error("Please enter a certificate key")]
    BlankKey,

    /// A field was present but outside its permitted shape or range.
    #[error("{field} {reason}")]
    OutOfRange { field: Field, reason: String },
}

impl ValidationError {
    /// The field that failed validation.
    pub fn field(&self) -> Field {
        match self {
            Self::MissingField { field }
            | Self::InvalidDate { field, .. }
            | Self::OutOfRange { field, .. } => *field,
            Self::FutureDate { .. } => Field::DateAwarded,
            Self::BlankKey => Field::CertificateKey,
        }
    }
}
