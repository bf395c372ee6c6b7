//! Datastore error types.

use crate::config::ConfigError;

/// Errors from a [`crate::Datastore`] call.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or failed server-side.
    #[error("datastore unavailable ({backend}): {reason}")]
    Unavailable {
        backend: &'static str,
        reason: String,
    },

    /// The backend refused the request.
    #[error("datastore rejected {operation} on {table}: {message}")]
    Rejected {
        table: String,
        operation: &'static str,
        /// HTTP status or SQLSTATE, when the backend reports one.
        code: Option<String>,
        message: String,
    },

    /// A storage-level uniqueness constraint was violated.
    #[error("unique constraint {constraint} violated on {table}")]
    Conflict { table: String, constraint: String },

    /// An insert succeeded but the backend returned no row.
    #[error("insert into {table} returned no row")]
    NoRowReturned { table: String },

    /// A row could not be converted to or from its record type.
    #[error("failed to decode {table} row: {reason}")]
    Decode { table: String, reason: String },

    /// A table or column name is not a plain identifier.
    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),

    /// Backend configuration is incomplete or malformed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StoreError {
    /// Whether resubmitting the same request later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
