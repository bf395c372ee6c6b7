//! GET /v1/catalog: picker values for the issuance and course forms.

use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubjectResponse {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Offered course names, certificate types, and course subjects.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CatalogResponse {
    pub courses: Vec<String>,
    pub certificate_types: Vec<String>,
    pub subjects: Vec<SubjectResponse>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/catalog", get(get_catalog))
}

#[utoipa::path(
    get,
    path = "/v1/catalog",
    responses((status = 200, description = "Form picker values", body = CatalogResponse)),
    tag = "catalog"
)]
pub(crate) async fn get_catalog() -> Json<CatalogResponse> {
    let catalog = lms_core::catalog::catalog();
    Json(CatalogResponse {
        courses: catalog.courses.iter().map(|c| c.to_string()).collect(),
        certificate_types: catalog.certificate_types.iter().map(|t| t.to_string()).collect(),
        subjects: catalog
            .subjects
            .into_iter()
            .map(|s| SubjectResponse {
                id: s.id.as_str().to_string(),
                name: s.name.to_string(),
                color: s.color.to_string(),
            })
            .collect(),
    })
}
