//! # lms-api: Axum HTTP Service for the LMS Stack
//!
//! ## API Surface
//!
//! | Prefix                | Module                     | Domain |
//! |-----------------------|----------------------------|--------|
//! | `/v1/certificates/*`  | [`routes::certificates`]   | Issuance and validation |
//! | `/v1/courses`         | [`routes::courses`]        | Course catalogue |
//! | `/v1/catalog`         | [`routes::catalog`]        | Form picker values |
//! | `/openapi.json`       | [`openapi`]                | OpenAPI document |
//! | `/health/*`           | this module                | Probes |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::certificates::router())
        .merge(routes::courses::router())
        .merge(routes::catalog::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

/// Liveness probe: 200 whenever the process is running.
async fn liveness() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct Readiness {
    status: &'static str,
    backend: &'static str,
}

/// Readiness probe: reports which datastore backend is in use.
async fn readiness(State(state): State<AppState>) -> Json<Readiness> {
    Json(Readiness {
        status: "ready",
        backend: state.store.backend_name(),
    })
}
