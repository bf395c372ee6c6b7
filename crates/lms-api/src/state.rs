//! # Application State
//!
//! Shared handles for every request: the datastore, the clock, and the
//! service configuration. Cloning is cheap; all fields are `Arc`s or small
//! values.

use std::sync::Arc;

use lms_certs::{CertificateIssuer, CertificateValidator};
use lms_core::{Clock, SystemClock};
use lms_store::{Datastore, MemoryStore};
use zeroize::Zeroizing;

/// Service configuration, read from the environment at startup.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret. If `None`, authentication is disabled.
    pub auth_token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
        }
    }
}

impl AppConfig {
    /// Variables: `PORT` (default 8080), `AUTH_TOKEN` (optional).
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let auth_token = std::env::var("AUTH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(Zeroizing::new);
        Self { port, auth_token }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Datastore>,
    pub clock: Arc<dyn Clock>,
    pub config: AppConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.backend_name())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// In-memory store, system clock, auth disabled.
    pub fn new() -> Self {
        Self::with_store(
            Arc::new(MemoryStore::with_default_schema()),
            Arc::new(SystemClock),
            AppConfig::default(),
        )
    }

    pub fn with_store(store: Arc<dyn Datastore>, clock: Arc<dyn Clock>, config: AppConfig) -> Self {
        Self { store, clock, config }
    }

    pub fn issuer(&self) -> CertificateIssuer {
        CertificateIssuer::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    pub fn validator(&self) -> CertificateValidator {
        CertificateValidator::new(Arc::clone(&self.store))
    }
}
