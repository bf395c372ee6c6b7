//! Datastore backend configuration.
//!
//! Selected by `LMS_STORE` (`memory`, `postgres`, `rest`). Each backend
//! reads its own variables; secrets are redacted from `Debug` output.

use url::Url;
use zeroize::Zeroizing;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which backend to open, with its settings.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Memory,
    Postgres(PostgresConfig),
    Rest(RestConfig),
}

/// Self-hosted PostgreSQL.
#[derive(Clone)]
pub struct PostgresConfig {
    pub url: Zeroizing<String>,
    pub max_connections: u32,
}

impl std::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Hosted PostgREST endpoint.
///
/// Custom `Debug` implementation redacts the `api_key` field.
#[derive(Clone)]
pub struct RestConfig {
    /// Project base URL; requests go to `{base_url}/rest/v1/{table}`.
    pub base_url: Url,
    pub api_key: Zeroizing<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RestConfig {
    /// Configuration pointing at a local mock server (for testing).
    pub fn local_mock(base_url: &str, api_key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("LMS_REST_URL", base_url)?,
            api_key: Zeroizing::new(api_key.to_string()),
            timeout_secs: 5,
        })
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `LMS_STORE` (default: `postgres` when `DATABASE_URL` is set, else
    ///   `rest` when `LMS_REST_URL` is set, else `memory`)
    /// - `DATABASE_URL` (required for `postgres`)
    /// - `LMS_DB_MAX_CONNECTIONS` (default: 10)
    /// - `LMS_REST_URL`, `LMS_REST_API_KEY` (required for `rest`)
    /// - `LMS_REST_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = lookup("LMS_STORE").unwrap_or_else(|| {
            if lookup("DATABASE_URL").is_some() {
                "postgres".to_string()
            } else if lookup("LMS_REST_URL").is_some() {
                "rest".to_string()
            } else {
                "memory".to_string()
            }
        });
        match backend.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => {
                let url = required(&lookup, "DATABASE_URL")?;
                Ok(Self::Postgres(PostgresConfig {
                    url: Zeroizing::new(url),
                    max_connections: number(&lookup, "LMS_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
                }))
            }
            "rest" => {
                let raw_url = required(&lookup, "LMS_REST_URL")?;
                let api_key = required(&lookup, "LMS_REST_API_KEY")?;
                Ok(Self::Rest(RestConfig {
                    base_url: parse_url("LMS_REST_URL", &raw_url)?,
                    api_key: Zeroizing::new(api_key),
                    timeout_secs: number(&lookup, "LMS_REST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
                }))
            }
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres(_) => "postgres",
            Self::Rest(_) => "rest",
        }
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Result<String, ConfigError> {
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVar(var.to_string()))
}

fn number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw)),
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(String),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("unknown datastore backend {0:?} (expected memory, postgres or rest)")]
    UnknownBackend(String),
    #[error("{0} must be a number, got {1:?}")]
    InvalidNumber(String, String),
    #[error("LMS_REST_API_KEY is not a valid header value")]
    InvalidApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_to_memory() {
        let cfg = StoreConfig::from_lookup(env(&[])).unwrap();
        assert!(matches!(cfg, StoreConfig::Memory));
    }

    #[test]
    fn backend_inferred_from_present_variables() {
        let cfg = StoreConfig::from_lookup(env(&[("DATABASE_URL", "postgres://localhost/lms")])).unwrap();
        assert_eq!(cfg.backend_name(), "postgres");

        let cfg = StoreConfig::from_lookup(env(&[
            ("LMS_REST_URL", "https://project.example.co"),
            ("LMS_REST_API_KEY", "anon-key"),
        ]))
        .unwrap();
        assert_eq!(cfg.backend_name(), "rest");
    }

    #[test]
    fn postgres_requires_database_url() {
        let err = StoreConfig::from_lookup(env(&[("LMS_STORE", "postgres")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(v) if v == "DATABASE_URL"));

        let cfg = StoreConfig::from_lookup(env(&[
            ("LMS_STORE", "postgres"),
            ("DATABASE_URL", "postgres://u:p@localhost/lms"),
        ]))
        .unwrap();
        match cfg {
            StoreConfig::Postgres(pg) => assert_eq!(pg.max_connections, 10),
            other => panic!("expected postgres, got {other:?}"),
        }
    }

    #[test]
    fn rest_reads_url_key_and_timeout() {
        let cfg = StoreConfig::from_lookup(env(&[
            ("LMS_STORE", "REST"),
            ("LMS_REST_URL", "https://project.example.co"),
            ("LMS_REST_API_KEY", "anon-key"),
            ("LMS_REST_TIMEOUT_SECS", "7"),
        ]))
        .unwrap();
        match cfg {
            StoreConfig::Rest(rest) => {
                assert_eq!(rest.base_url.as_str(), "https://project.example.co/");
                assert_eq!(rest.api_key.as_str(), "anon-key");
                assert_eq!(rest.timeout_secs, 7);
            }
            other => panic!("expected rest, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            StoreConfig::from_lookup(env(&[("LMS_STORE", "redis")])),
            Err(ConfigError::UnknownBackend(_))
        ));
        assert!(matches!(
            StoreConfig::from_lookup(env(&[
                ("LMS_STORE", "rest"),
                ("LMS_REST_URL", "not a url"),
                ("LMS_REST_API_KEY", "k"),
            ])),
            Err(ConfigError::InvalidUrl(..))
        ));
        assert!(matches!(
            StoreConfig::from_lookup(env(&[
                ("LMS_STORE", "postgres"),
                ("DATABASE_URL", "postgres://localhost/lms"),
                ("LMS_DB_MAX_CONNECTIONS", "many"),
            ])),
            Err(ConfigError::InvalidNumber(..))
        ));
    }

    #[test]
    fn debug_redacts_secrets() {
        let rest = RestConfig::local_mock("http://127.0.0.1:9000", "super-secret").unwrap();
        let out = format!("{rest:?}");
        assert!(!out.contains("super-secret"));
        assert!(out.contains("[REDACTED]"));

        let pg = PostgresConfig {
            url: Zeroizing::new("postgres://user:hunter2@db/lms".into()),
            max_connections: 4,
        };
        assert!(!format!("{pg:?}").contains("hunter2"));
    }
}
