//! Hosted PostgREST backend.
//!
//! Talks to `{base_url}/rest/v1/{table}` with the project API key in both
//! the `apikey` and `Authorization: Bearer` headers.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | find      | `GET ?select=*&{col}=eq.{value}&limit=1` |
//! | insert    | `POST` with `Prefer: return=representation` |
//! | select    | `GET ?select=*&...&order={col}.desc&limit=&offset=` |
//!
//! Every call is a single attempt.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::{ConfigError, RestConfig};
use crate::{validate_identifier, validate_selection, Datastore, Filter, Row, Selection, StoreError};

const BACKEND: &str = "rest";

/// SQLSTATE for unique_violation, as relayed in PostgREST error bodies.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgREST [`Datastore`].
#[derive(Debug, Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base_url: Url,
}

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl RestStore {
    pub fn new(config: RestConfig) -> Result<Self, StoreError> {
        if config.base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(
                "LMS_REST_URL".into(),
                "not a base URL".into(),
            )
            .into());
        }

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(config.api_key.as_str())
            .map_err(|_| ConfigError::InvalidApiKey)?;
        key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key.as_str()))
            .map_err(|_| ConfigError::InvalidApiKey)?;
        bearer.set_sensitive(true);
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Unavailable {
                backend: BACKEND,
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    fn endpoint(&self, table: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["rest", "v1", table]);
        }
        url
    }

    fn listing_url(&self, table: &str, selection: &Selection) -> Url {
        let mut url = self.endpoint(table);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            for (column, value) in selection.filter.conditions() {
                query.append_pair(column, &filter_operand(value));
            }
            if let Some(column) = &selection.order_by {
                let direction = if selection.descending { "desc" } else { "asc" };
                query.append_pair("order", &format!("{column}.{direction}"));
            }
            if let Some(limit) = selection.limit {
                query.append_pair("limit", &limit.to_string());
            }
            if selection.offset > 0 {
                query.append_pair("offset", &selection.offset.to_string());
            }
        }
        url
    }

    async fn fetch_rows(
        &self,
        table: &str,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<Row>, StoreError> {
        let resp = request.send().await.map_err(|e| StoreError::Unavailable {
            backend: BACKEND,
            reason: format!("{operation} {table}: {e}"),
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify(table, operation, status, &body));
        }

        resp.json::<Vec<Row>>().await.map_err(|e| StoreError::Decode {
            table: table.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Datastore for RestStore {
    async fn find(&self, table: &str, filter: &Filter) -> Result<Option<Row>, StoreError> {
        let selection = Selection {
            filter: filter.clone(),
            limit: Some(1),
            ..Default::default()
        };
        validate_selection(table, &selection)?;
        let url = self.listing_url(table, &selection);
        let rows = self.fetch_rows(table, "find", self.http.get(url)).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        validate_identifier(table)?;
        for column in row.keys() {
            validate_identifier(column)?;
        }
        let request = self
            .http
            .post(self.endpoint(table))
            .header("Prefer", "return=representation")
            .json(&Value::Object(row));
        let rows = self.fetch_rows(table, "insert", request).await?;
        rows.into_iter().next().ok_or_else(|| StoreError::NoRowReturned {
            table: table.to_string(),
        })
    }

    async fn select(&self, table: &str, selection: &Selection) -> Result<Vec<Row>, StoreError> {
        validate_selection(table, selection)?;
        let url = self.listing_url(table, selection);
        self.fetch_rows(table, "select", self.http.get(url)).await
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }
}

fn filter_operand(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_string(),
        Value::String(s) => format!("eq.{s}"),
        other => format!("eq.{other}"),
    }
}

fn classify(table: &str, operation: &'static str, status: StatusCode, body: &str) -> StoreError {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();

    // PostgREST also answers 409 for foreign-key violations; trust the
    // SQLSTATE when the body carries one.
    let unique_violation = match parsed.code.as_deref() {
        Some(code) => code == UNIQUE_VIOLATION,
        None => status == StatusCode::CONFLICT,
    };
    if unique_violation {
        return StoreError::Conflict {
            table: table.to_string(),
            constraint: parsed
                .details
                .or(parsed.message)
                .unwrap_or_else(|| "unique".to_string()),
        };
    }

    if status.is_server_error() {
        return StoreError::Unavailable {
            backend: BACKEND,
            reason: format!("{operation} {table}: HTTP {status}"),
        };
    }

    StoreError::Rejected {
        table: table.to_string(),
        operation,
        code: Some(parsed.code.unwrap_or_else(|| status.as_u16().to_string())),
        message: parsed.message.unwrap_or_else(|| body.to_string()),
    }
}
