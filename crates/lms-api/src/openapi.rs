//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into a single OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LMS API",
        description = "Certificate issuance and validation, and the course catalogue.",
        license(name = "MIT")
    ),
    paths(
        crate::routes::certificates::issue_certificate,
        crate::routes::certificates::validate_certificate,
        crate::routes::certificates::get_certificate,
        crate::routes::courses::create_course,
        crate::routes::courses::list_courses,
        crate::routes::catalog::get_catalog,
    ),
    components(schemas(
        crate::routes::certificates::IssueCertificateRequest,
        crate::routes::certificates::ValidateCertificateRequest,
        crate::routes::certificates::CertificateResponse,
        crate::routes::certificates::ValidationResponse,
        crate::routes::courses::CreateCourseRequest,
        crate::routes::courses::CourseResponse,
        crate::routes::courses::CourseListResponse,
        crate::routes::catalog::CatalogResponse,
        crate::routes::catalog::SubjectResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::auth::Role,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "certificates", description = "Certificate issuance and validation"),
        (name = "courses", description = "Course catalogue"),
        (name = "catalog", description = "Form picker values"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by authenticated routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("{role}:{user_id}:{secret}"))
                    .build(),
            ),
        );
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
