//! # Certificate Records
//!
//! The certificate is the only persisted domain entity of the issuance
//! feature. Three shapes exist:
//!
//! - [`CertificateDraft`]: raw submission, exactly as typed.
//! - [`CertificateFields`]: the validated duplicate tuple (trimmed, dated).
//! - [`CertificateRecord`]: the persisted row, with key and `created_at`.
//!
//! Records are created once and never updated.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Field, ValidationError};
use crate::identity::CertificateKey;
use crate::keygen::derive_certificate_key;
use crate::temporal::Timestamp;

/// Maximum length of a free-text certificate field, in characters.
pub const MAX_FIELD_CHARS: usize = 255;

/// Raw issuance input.
///
/// All fields default to empty so that a missing field surfaces as a
/// [`ValidationError::MissingField`] rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateDraft {
    #[serde(default, alias = "studentName")]
    pub student_name: String,
    #[serde(default, alias = "courseName")]
    pub course_name: String,
    #[serde(default, alias = "certificateType")]
    pub certificate_type: String,
    /// Calendar date, `YYYY-MM-DD`. A full RFC 3339 timestamp is also accepted.
    #[serde(default, alias = "dateAwarded")]
    pub date_awarded: String,
}

impl CertificateDraft {
    pub fn new(
        student_name: impl Into<String>,
        course_name: impl Into<String>,
        certificate_type: impl Into<String>,
        date_awarded: impl Into<String>,
    ) -> Self {
        Self {
            student_name: student_name.into(),
            course_name: course_name.into(),
            certificate_type: certificate_type.into(),
            date_awarded: date_awarded.into(),
        }
    }

    /// Validate against `today`, stopping at the first failure.
    ///
    /// Order: student name, course name, certificate type, award date
    /// present and parseable, award date not after `today`.
    pub fn validate(&self, today: NaiveDate) -> Result<CertificateFields, ValidationError> {
        let student_name = required_text(&self.student_name, Field::StudentName)?;
        let course_name = required_text(&self.course_name, Field::CourseName)?;
        let certificate_type = required_text(&self.certificate_type, Field::CertificateType)?;

        let raw_date = self.date_awarded.trim();
        if raw_date.is_empty() {
            return Err(ValidationError::MissingField {
                field: Field::DateAwarded,
            });
        }
        let date_awarded = parse_award_date(raw_date)?;
        if date_awarded > today {
            return Err(ValidationError::FutureDate {
                date: date_awarded,
                today,
            });
        }

        Ok(CertificateFields {
            student_name,
            course_name,
            certificate_type,
            date_awarded,
        })
    }
}

fn required_text(value: &str, field: Field) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    if trimmed.chars().count() > MAX_FIELD_CHARS {
        return Err(ValidationError::OutOfRange {
            field,
            reason: format!("must not exceed {MAX_FIELD_CHARS} characters"),
        });
    }
    Ok(trimmed.to_string())
}

/// Parse `YYYY-MM-DD`, falling back to the date part of an RFC 3339 timestamp.
pub fn parse_award_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| ValidationError::InvalidDate {
            field: Field::DateAwarded,
            value: raw.to_string(),
        })
}

/// The validated duplicate tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertificateFields {
    pub student_name: String,
    pub course_name: String,
    pub certificate_type: String,
    pub date_awarded: NaiveDate,
}

impl CertificateFields {
    /// Derive the key for these fields issued at `issued_at`.
    pub fn derive_key(&self, issued_at: Timestamp) -> CertificateKey {
        derive_certificate_key(
            &self.student_name,
            &self.course_name,
            &self.certificate_type,
            self.date_awarded,
            issued_at,
        )
    }

    /// Assemble the record that will be persisted.
    pub fn into_record(self, key: CertificateKey, created_at: Timestamp) -> CertificateRecord {
        CertificateRecord {
            key,
            student_name: self.student_name,
            course_name: self.course_name,
            certificate_type: self.certificate_type,
            date_awarded: self.date_awarded,
            created_at,
        }
    }
}

/// A persisted certificate.
///
/// Serialized with the storage column names (`certificate_key`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    #[serde(rename = "certificate_key")]
    pub key: CertificateKey,
    pub student_name: String,
    pub course_name: String,
    pub certificate_type: String,
    pub date_awarded: NaiveDate,
    pub created_at: Timestamp,
}

impl CertificateRecord {
    /// The identifying tuple of this record.
    pub fn fields(&self) -> CertificateFields {
        CertificateFields {
            student_name: self.student_name.clone(),
            course_name: self.course_name.clone(),
            certificate_type: self.certificate_type.clone(),
            date_awarded: self.date_awarded,
        }
    }
}
