//! # lms-store: The Persistence Collaborator
//!
//! Every read and write of the LMS stack goes through the [`Datastore`]
//! trait: a filtered point lookup, an insert that returns the persisted row
//! with server-assigned fields populated, and a filtered, ordered, paged
//! listing. Any backend that can do those three things will do.
//!
//! ## Backends
//!
//! | Backend        | Module        | Use |
//! |----------------|---------------|-----|
//! | [`MemoryStore`]| [`memory`]    | Tests and local development. |
//! | [`PgStore`]    | [`postgres`]  | Self-hosted PostgreSQL via SQLx, with embedded migrations. |
//! | [`RestStore`]  | [`rest`]      | Hosted PostgREST endpoint (backend-as-a-service). |
//!
//! [`connect`] picks one from a [`StoreConfig`].
//!
//! ## Rows
//!
//! Rows travel as JSON objects keyed by column name. Typed callers convert
//! with [`to_row`] / [`from_row`]. Table and column names are checked by
//! [`validate_identifier`] before any backend sees them.
//!
//! ## Error Contract
//!
//! "No matching row" is `Ok(None)` / an empty `Vec`, never an error.
//! Transport failures are [`StoreError::Unavailable`]; uniqueness violations
//! are [`StoreError::Conflict`]. Nothing here retries.

pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod rest;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use config::{ConfigError, PostgresConfig, RestConfig, StoreConfig};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use rest::RestStore;

/// A stored row: column name → JSON value.
pub type Row = serde_json::Map<String, Value>;

/// Exact-match conditions, ANDed together, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Vec<(String, Value)>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `column = value`.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push((column.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `row` satisfies every condition.
    pub fn matches(&self, row: &Row) -> bool {
        self.0
            .iter()
            .all(|(column, value)| row.get(column).unwrap_or(&Value::Null) == value)
    }
}

/// A listing request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub filter: Filter,
    pub order_by: Option<String>,
    pub descending: bool,
    pub limit: Option<u32>,
    pub offset: u64,
}

/// The persistence contract.
///
/// Implementations must be `Send + Sync` so one handle can be shared across
/// request handlers behind an `Arc`.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Return zero or one row of `table` matching `filter`.
    async fn find(&self, table: &str, filter: &Filter) -> Result<Option<Row>, StoreError>;

    /// Insert `row` into `table` and return the row as persisted.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError>;

    /// List rows of `table` per `selection`.
    async fn select(&self, table: &str, selection: &Selection) -> Result<Vec<Row>, StoreError>;

    /// Short backend name for logs and readiness probes.
    fn backend_name(&self) -> &'static str;
}

/// Open the backend described by `config`.
pub async fn connect(config: StoreConfig) -> Result<Arc<dyn Datastore>, StoreError> {
    let store: Arc<dyn Datastore> = match config {
        StoreConfig::Memory => Arc::new(MemoryStore::with_default_schema()),
        StoreConfig::Postgres(pg) => Arc::new(PgStore::connect(&pg).await?),
        StoreConfig::Rest(rest) => Arc::new(RestStore::new(rest)?),
    };
    tracing::info!(backend = store.backend_name(), "datastore ready");
    Ok(store)
}

/// Check that `name` is a plain SQL identifier: `[a-z_][a-z0-9_]*`.
pub fn validate_identifier(name: &str) -> Result<(), StoreError> {
    let mut bytes = name.bytes();
    let first_ok = matches!(bytes.next(), Some(b) if b == b'_' || b.is_ascii_lowercase());
    let rest_ok = bytes.all(|b| b == b'_' || b.is_ascii_lowercase() || b.is_ascii_digit());
    if first_ok && rest_ok && name.len() <= 63 {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Validate the table name and every column named by `selection`.
pub(crate) fn validate_selection(table: &str, selection: &Selection) -> Result<(), StoreError> {
    validate_identifier(table)?;
    for (column, _) in selection.filter.conditions() {
        validate_identifier(column)?;
    }
    if let Some(column) = &selection.order_by {
        validate_identifier(column)?;
    }
    Ok(())
}

/// Serialize a record into a row.
pub fn to_row<T: Serialize>(table: &str, value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(StoreError::Decode {
            table: table.to_string(),
            reason: format!("expected a JSON object, got {other}"),
        }),
        Err(e) => Err(StoreError::Decode {
            table: table.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Deserialize a row into a record.
pub fn from_row<T: DeserializeOwned>(table: &str, row: Row) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| StoreError::Decode {
        table: table.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identifiers() {
        assert!(validate_identifier("certificates").is_ok());
        assert!(validate_identifier("_x1").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("Certificates").is_err());
        assert!(validate_identifier("a; drop table x").is_err());
        assert!(validate_identifier(&"a".repeat(64)).is_err());
    }

    #[test]
    fn filter_matches_all_conditions() {
        let row = to_row("t", &json!({"a": "x", "b": 2})).unwrap();
        assert!(Filter::new().matches(&row));
        assert!(Filter::new().eq("a", "x").eq("b", 2).matches(&row));
        assert!(!Filter::new().eq("a", "x").eq("b", 3).matches(&row));
        assert!(!Filter::new().eq("c", "x").matches(&row));
        assert!(Filter::new().eq("c", Value::Null).matches(&row));
    }

    #[test]
    fn to_row_rejects_non_objects() {
        assert!(matches!(to_row("t", &42), Err(StoreError::Decode { .. })));
    }

    #[test]
    fn selection_validation_checks_columns() {
        let sel = Selection {
            filter: Filter::new().eq("ok", 1),
            order_by: Some("bad column".into()),
            ..Default::default()
        };
        assert!(validate_selection("t", &sel).is_err());
    }
}
