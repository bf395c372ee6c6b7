//! # Certificate Routes
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/v1/certificates` | Issue a certificate |
//! | POST   | `/v1/certificates/validate` | Validate a key (found or not) |
//! | GET    | `/v1/certificates/:key` | Fetch by key, 404 when absent |
//!
//! All three are public.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use lms_certs::Validation;
use lms_core::{CertificateDraft, CertificateRecord};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Certificate issuance request. Fields may also be sent in camelCase.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueCertificateRequest {
    #[serde(default, alias = "studentName")]
    pub student_name: String,
    #[serde(default, alias = "courseName")]
    pub course_name: String,
    #[serde(default, alias = "certificateType")]
    pub certificate_type: String,
    /// `YYYY-MM-DD`; must not be after today (UTC).
    #[serde(default, alias = "dateAwarded")]
    #[schema(example = "2026-01-14")]
    pub date_awarded: String,
}

impl From<IssueCertificateRequest> for CertificateDraft {
    fn from(req: IssueCertificateRequest) -> Self {
        CertificateDraft::new(
            req.student_name,
            req.course_name,
            req.certificate_type,
            req.date_awarded,
        )
    }
}

/// Key validation request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateCertificateRequest {
    #[serde(default, alias = "certificateKey")]
    pub certificate_key: String,
}

/// A persisted certificate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CertificateResponse {
    /// 64-character lowercase hex key; the only handle for later lookup.
    pub certificate_key: String,
    pub student_name: String,
    pub course_name: String,
    pub certificate_type: String,
    #[schema(example = "2026-01-14")]
    pub date_awarded: String,
    #[schema(example = "2026-01-15T12:00:00.000Z")]
    pub created_at: String,
}

impl From<CertificateRecord> for CertificateResponse {
    fn from(record: CertificateRecord) -> Self {
        Self {
            certificate_key: record.key.to_string(),
            student_name: record.student_name,
            course_name: record.course_name,
            certificate_type: record.certificate_type,
            date_awarded: record.date_awarded.format("%Y-%m-%d").to_string(),
            created_at: record.created_at.to_iso8601(),
        }
    }
}

/// Outcome of a key validation. `certificate` is null when `valid` is false.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationResponse {
    pub valid: bool,
    pub certificate: Option<CertificateResponse>,
}

impl From<Validation> for ValidationResponse {
    fn from(outcome: Validation) -> Self {
        let certificate = outcome.into_record().map(CertificateResponse::from);
        Self {
            valid: certificate.is_some(),
            certificate,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/certificates", post(issue_certificate))
        .route("/v1/certificates/validate", post(validate_certificate))
        .route("/v1/certificates/:key", get(get_certificate))
}

/// POST /v1/certificates: Issue a certificate.
#[utoipa::path(
    post,
    path = "/v1/certificates",
    request_body = IssueCertificateRequest,
    responses(
        (status = 201, description = "Certificate issued", body = CertificateResponse),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 409, description = "A certificate with these details already exists", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 503, description = "Datastore unavailable", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub(crate) async fn issue_certificate(
    State(state): State<AppState>,
    body: Result<Json<IssueCertificateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CertificateResponse>), AppError> {
    let draft = CertificateDraft::from(extract_json(body)?);
    let record = state.issuer().issue(&draft).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// POST /v1/certificates/validate: Look a key up.
#[utoipa::path(
    post,
    path = "/v1/certificates/validate",
    request_body = ValidateCertificateRequest,
    responses(
        (status = 200, description = "Lookup complete; `valid` reports whether the key exists", body = ValidationResponse),
        (status = 422, description = "Blank key", body = crate::error::ErrorBody),
        (status = 503, description = "Datastore unavailable", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub(crate) async fn validate_certificate(
    State(state): State<AppState>,
    body: Result<Json<ValidateCertificateRequest>, JsonRejection>,
) -> Result<Json<ValidationResponse>, AppError> {
    let req = extract_json(body)?;
    let outcome = state.validator().validate(&req.certificate_key).await?;
    Ok(Json(outcome.into()))
}

/// GET /v1/certificates/:key: Fetch a certificate by key.
#[utoipa::path(
    get,
    path = "/v1/certificates/{key}",
    params(("key" = String, Path, description = "Certificate key")),
    responses(
        (status = 200, description = "Certificate found", body = CertificateResponse),
        (status = 404, description = "No certificate with this key", body = crate::error::ErrorBody),
        (status = 503, description = "Datastore unavailable", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub(crate) async fn get_certificate(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<CertificateResponse>, AppError> {
    match state.validator().validate(&key).await? {
        Validation::Found(record) => Ok(Json(record.into())),
        Validation::NotFound => Err(AppError::NotFound("certificate not found".into())),
    }
}
