//! In-memory backend.
//!
//! Thread-safe and cloneable; clones share the same tables. All operations
//! are synchronous under a `parking_lot::RwLock` that is never held across
//! an `.await`. Unique constraints are optional and declared per table.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::schema::{certificates, courses};
use crate::{validate_identifier, validate_selection, Datastore, Filter, Row, Selection, StoreError};

const BACKEND: &str = "memory";

#[derive(Debug, Clone)]
struct UniqueConstraint {
    name: String,
    columns: Vec<String>,
}

/// In-memory [`Datastore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<Row>>>>,
    unique: Arc<RwLock<HashMap<String, Vec<UniqueConstraint>>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    /// An empty store with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store enforcing the same unique constraints as the SQL migrations.
    pub fn with_default_schema() -> Self {
        let store = Self::new();
        store.add_unique(certificates::TABLE, certificates::KEY_CONSTRAINT, &[certificates::KEY]);
        store.add_unique(certificates::TABLE, certificates::TUPLE_CONSTRAINT, &certificates::TUPLE);
        store.add_unique(courses::TABLE, courses::KEY_CONSTRAINT, &[courses::ID]);
        store
    }

    /// Declare a unique constraint over `columns` of `table`.
    pub fn add_unique(&self, table: &str, name: &str, columns: &[&str]) {
        self.unique
            .write()
            .entry(table.to_string())
            .or_default()
            .push(UniqueConstraint {
                name: name.to_string(),
                columns: columns.iter().map(|c| c.to_string()).collect(),
            });
    }

    /// Simulate an outage: while offline every call fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// Number of rows in `table`.
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable {
                backend: BACKEND,
                reason: "store is offline".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn find(&self, table: &str, filter: &Filter) -> Result<Option<Row>, StoreError> {
        validate_selection(
            table,
            &Selection {
                filter: filter.clone(),
                ..Default::default()
            },
        )?;
        self.check_online()?;
        Ok(self
            .tables
            .read()
            .get(table)
            .and_then(|rows| rows.iter().find(|row| filter.matches(row)).cloned()))
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, StoreError> {
        validate_identifier(table)?;
        for column in row.keys() {
            validate_identifier(column)?;
        }
        self.check_online()?;

        if let Some(column) = created_at_default(table) {
            row.entry(column)
                .or_insert_with(|| Value::String(now_iso()));
        }

        let unique = self.unique.read();
        let mut tables = self.tables.write();
        let rows = tables.entry(table.to_string()).or_default();

        if let Some(constraints) = unique.get(table) {
            for constraint in constraints {
                let clash = rows.iter().any(|existing| {
                    constraint
                        .columns
                        .iter()
                        .all(|c| existing.get(c).unwrap_or(&Value::Null) == row.get(c).unwrap_or(&Value::Null))
                });
                if clash {
                    return Err(StoreError::Conflict {
                        table: table.to_string(),
                        constraint: constraint.name.clone(),
                    });
                }
            }
        }

        rows.push(row.clone());
        Ok(row)
    }

    async fn select(&self, table: &str, selection: &Selection) -> Result<Vec<Row>, StoreError> {
        validate_selection(table, selection)?;
        self.check_online()?;

        let mut rows: Vec<Row> = self
            .tables
            .read()
            .get(table)
            .map(|rows| rows.iter().filter(|r| selection.filter.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some(column) = &selection.order_by {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(column), b.get(column));
                if selection.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        let offset = usize::try_from(selection.offset).unwrap_or(usize::MAX);
        let limit = selection.limit.map_or(usize::MAX, |l| l as usize);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }
}

/// Column the SQL migration fills with `DEFAULT now()`, if the table has one.
fn created_at_default(table: &str) -> Option<&'static str> {
    match table {
        certificates::TABLE => Some(certificates::CREATED_AT),
        courses::TABLE => Some(courses::CREATED_AT),
        _ => None,
    }
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Nulls first, then numbers, then strings (as instants when both parse as
/// RFC 3339); other JSON types compare equal.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.unwrap_or(&Value::Null), b.unwrap_or(&Value::Null)) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => {
            match (
                chrono::DateTime::parse_from_rfc3339(x),
                chrono::DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Number(_), Value::String(_)) => Ordering::Less,
        (Value::String(_), Value::Number(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_row;
    use serde_json::json;

    fn row(v: Value) -> Row {
        to_row("t", &v).unwrap()
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryStore::new();
        store.insert("items", row(json!({"id": 1, "name": "a"}))).await.unwrap();
        let found = store.find("items", &Filter::new().eq("name", "a")).await.unwrap();
        assert_eq!(found.unwrap()["id"], 1);
        let missing = store.find("items", &Filter::new().eq("name", "b")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn find_on_unknown_table_is_none() {
        let store = MemoryStore::new();
        assert!(store.find("nothing", &Filter::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_assigns_created_at_on_schema_tables() {
        let store = MemoryStore::new();
        for table in [certificates::TABLE, courses::TABLE] {
            let persisted = store.insert(table, row(json!({"id": 1}))).await.unwrap();
            assert!(persisted[certificates::CREATED_AT].as_str().unwrap().ends_with('Z'), "{table}");
        }

        let explicit = store
            .insert(
                certificates::TABLE,
                row(json!({"id": 2, "created_at": "2026-01-01T00:00:00.000Z"})),
            )
            .await
            .unwrap();
        assert_eq!(explicit["created_at"], "2026-01-01T00:00:00.000Z");
    }

    #[tokio::test]
    async fn other_tables_get_no_created_at() {
        let store = MemoryStore::new();
        let persisted = store.insert("items", row(json!({"id": 1}))).await.unwrap();
        assert!(!persisted.contains_key("created_at"));
        assert_eq!(persisted.len(), 1);
    }

    #[tokio::test]
    async fn unique_constraint_conflicts() {
        let store = MemoryStore::new();
        store.add_unique("items", "items_pair_key", &["a", "b"]);
        store.insert("items", row(json!({"a": 1, "b": 2}))).await.unwrap();
        store.insert("items", row(json!({"a": 1, "b": 3}))).await.unwrap();
        let err = store.insert("items", row(json!({"a": 1, "b": 2}))).await.unwrap_err();
        match err {
            StoreError::Conflict { constraint, .. } => assert_eq!(constraint, "items_pair_key"),
            other => panic!("expected Conflict, got {other:?}"),
        }
        assert_eq!(store.len("items"), 2);
    }

    #[tokio::test]
    async fn offline_store_is_unavailable() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let err = store.find("items", &Filter::new()).await.unwrap_err();
        assert!(err.is_transient());
        store.set_offline(false);
        assert!(store.find("items", &Filter::new()).await.is_ok());
    }

    #[tokio::test]
    async fn select_orders_and_pages() {
        let store = MemoryStore::new();
        for (i, subject) in ["python", "cpp", "python", "python"].iter().enumerate() {
            store
                .insert("courses", row(json!({"n": i, "subject": subject})))
                .await
                .unwrap();
        }
        let selection = Selection {
            filter: Filter::new().eq("subject", "python"),
            order_by: Some("n".into()),
            descending: true,
            limit: Some(2),
            offset: 0,
        };
        let page = store.select("courses", &selection).await.unwrap();
        let ns: Vec<i64> = page.iter().map(|r| r["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![3, 2]);

        let next = store
            .select("courses", &Selection { offset: 2, ..selection })
            .await
            .unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0]["n"], 0);
    }

    #[tokio::test]
    async fn timestamps_order_chronologically() {
        let store = MemoryStore::new();
        for ts in ["2026-01-15T12:00:00Z", "2026-01-15T12:00:00.500Z", "2026-01-15T11:59:59.999Z"] {
            store.insert("items", row(json!({"created_at": ts}))).await.unwrap();
        }
        let rows = store
            .select(
                "items",
                &Selection {
                    order_by: Some("created_at".into()),
                    descending: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let order: Vec<&str> = rows.iter().map(|r| r["created_at"].as_str().unwrap()).collect();
        assert_eq!(
            order,
            vec!["2026-01-15T12:00:00.500Z", "2026-01-15T12:00:00Z", "2026-01-15T11:59:59.999Z"]
        );
    }

    #[tokio::test]
    async fn clones_share_tables() {
        let store = MemoryStore::new();
        let clone = store.clone();
        clone.insert("items", row(json!({"id": 1}))).await.unwrap();
        assert_eq!(store.len("items"), 1);
    }

    #[tokio::test]
    async fn rejects_bad_identifiers() {
        let store = MemoryStore::new();
        let err = store
            .insert("items", row(json!({"bad column": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn default_schema_enforces_certificate_tuple() {
        let store = MemoryStore::with_default_schema();
        let base = json!({
            "certificate_key": "k1",
            "student_name": "Alice",
            "course_name": "Python",
            "certificate_type": "Completion",
            "date_awarded": "2026-01-14"
        });
        store.insert("certificates", row(base.clone())).await.unwrap();
        let mut dup = base;
        dup["certificate_key"] = json!("k2");
        let err = store.insert("certificates", row(dup)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }
}
