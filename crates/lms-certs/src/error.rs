//! Certificate flow errors.

use lms_core::ValidationError;
use lms_store::StoreError;
use serde::Serialize;

/// How a duplicate submission was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateCheck {
    /// The pre-insert lookup found a matching tuple.
    Lookup,
    /// The insert hit the storage-level uniqueness constraint.
    Constraint,
}

/// Failure of a certificate flow.
///
/// Validation and duplicate failures are expected outcomes a submitter can
/// fix by resubmitting; persistence failures are infrastructure trouble.
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("A certificate with these details already exists")]
    Duplicate { detected_by: DuplicateCheck },

    #[error("certificate store failure: {0}")]
    Persistence(#[from] StoreError),
}

impl CertificateError {
    /// Whether resubmitting the same input later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Persistence(e) if e.is_transient())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Duplicate { .. } => "DUPLICATE",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}
