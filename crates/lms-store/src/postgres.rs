//! PostgreSQL backend via SQLx.
//!
//! Rows cross the wire as `jsonb`: reads use `to_jsonb(t)` and inserts go
//! through `jsonb_populate_record`, so one set of queries serves every
//! table. Filter values are compared against the column's text rendering,
//! which keeps `DATE` and `UUID` columns matchable from JSON strings.
//!
//! Identifiers are validated before being spliced into SQL; values are
//! always bound.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::PostgresConfig;
use crate::{validate_identifier, validate_selection, Datastore, Filter, Row, Selection, StoreError};

const BACKEND: &str = "postgres";

/// PostgreSQL [`Datastore`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect, then apply the embedded migrations.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(config.url.as_str())
            .await
            .map_err(|e| unavailable(&e))?;
        tracing::info!("Connected to PostgreSQL");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Unavailable {
                backend: BACKEND,
                reason: format!("migration failed: {e}"),
            })?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }

    /// Wrap an existing pool. Migrations are the caller's concern.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Datastore for PgStore {
    async fn find(&self, table: &str, filter: &Filter) -> Result<Option<Row>, StoreError> {
        let selection = Selection {
            filter: filter.clone(),
            limit: Some(1),
            ..Default::default()
        };
        validate_selection(table, &selection)?;
        let (sql, binds) = select_sql(table, &selection);

        let mut query = sqlx::query_scalar::<_, Value>(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        let found = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(table, "find", e))?;

        found.map(|v| into_row(table, v)).transpose()
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        validate_identifier(table)?;
        for column in row.keys() {
            validate_identifier(column)?;
        }
        let sql = insert_sql(table, row.keys().map(String::as_str));

        let inserted = sqlx::query_scalar::<_, Value>(&sql)
            .bind(Value::Object(row))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(table, "insert", e))?;

        match inserted {
            Some(v) => into_row(table, v),
            None => Err(StoreError::NoRowReturned {
                table: table.to_string(),
            }),
        }
    }

    async fn select(&self, table: &str, selection: &Selection) -> Result<Vec<Row>, StoreError> {
        validate_selection(table, selection)?;
        let (sql, binds) = select_sql(table, selection);

        let mut query = sqlx::query_scalar::<_, Value>(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(table, "select", e))?;

        rows.into_iter().map(|v| into_row(table, v)).collect()
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }
}

/// Build a `SELECT` for `selection`; returns the SQL and the text binds in
/// placeholder order. Identifiers must already be validated.
fn select_sql(table: &str, selection: &Selection) -> (String, Vec<String>) {
    let mut sql = format!("SELECT to_jsonb(t) FROM {table} t");
    let mut binds = Vec::new();

    let mut clauses = Vec::new();
    for (column, value) in selection.filter.conditions() {
        match value {
            Value::Null => clauses.push(format!("t.{column} IS NULL")),
            other => {
                binds.push(text_value(other));
                clauses.push(format!("t.{column}::text = ${}", binds.len()));
            }
        }
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    if let Some(column) = &selection.order_by {
        let direction = if selection.descending { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY t.{column} {direction}"));
    }
    if let Some(limit) = selection.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if selection.offset > 0 {
        sql.push_str(&format!(" OFFSET {}", selection.offset));
    }
    (sql, binds)
}

fn insert_sql<'a>(table: &str, columns: impl Iterator<Item = &'a str>) -> String {
    let columns: Vec<&str> = columns.collect();
    let list = columns.join(", ");
    format!(
        "INSERT INTO {table} AS t ({list}) \
         SELECT {list} FROM jsonb_populate_record(NULL::{table}, $1) \
         RETURNING to_jsonb(t)"
    )
}

/// Text rendering of a JSON scalar, matching Postgres `::text` output.
fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn into_row(table: &str, value: Value) -> Result<Row, StoreError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::Decode {
            table: table.to_string(),
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

fn unavailable(err: &sqlx::Error) -> StoreError {
    StoreError::Unavailable {
        backend: BACKEND,
        reason: err.to_string(),
    }
}

fn classify(table: &str, operation: &'static str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict {
            table: table.to_string(),
            constraint: db.constraint().unwrap_or("unique").to_string(),
        },
        sqlx::Error::Database(db) => StoreError::Rejected {
            table: table.to_string(),
            operation,
            code: db.code().map(|c| c.into_owned()),
            message: db.message().to_string(),
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Protocol(_) => unavailable(&err),
        _ => StoreError::Rejected {
            table: table.to_string(),
            operation,
            code: None,
            message: err.to_string(),
        },
    }
}
