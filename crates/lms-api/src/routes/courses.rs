//! # Course Routes
//!
//! | Method | Path | Operation | Auth |
//! |--------|------|-----------|------|
//! | POST   | `/v1/courses` | Create a course | instructor or admin with a user id |
//! | GET    | `/v1/courses` | List courses, newest first | public |

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use lms_core::{CourseDraft, CourseQuery, CourseRecord, Subject};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query};
use crate::state::AppState;

/// Course creation request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    #[serde(default)]
    pub name: String,
    /// One of `cpp`, `python`, `cybersecurity`, `cryptography`, `webdev`, `general-skills`.
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub topic: String,
    /// Minutes, 1 to 1440.
    #[serde(default)]
    pub duration: u32,
}

impl From<CreateCourseRequest> for CourseDraft {
    fn from(req: CreateCourseRequest) -> Self {
        CourseDraft {
            name: req.name,
            subject: req.subject,
            topic: req.topic,
            duration: req.duration,
        }
    }
}

/// Listing parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCoursesParams {
    /// Page size (default 10, max 100).
    pub limit: Option<u32>,
    /// 1-based page number.
    pub page: Option<u32>,
    pub subject: Option<String>,
    pub topic: Option<String>,
}

impl ListCoursesParams {
    fn into_query(self) -> Result<CourseQuery, AppError> {
        let subject = match self.subject.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<Subject>()?),
        };
        Ok(CourseQuery {
            limit: self.limit,
            page: self.page,
            subject,
            topic: self.topic,
        })
    }
}

/// A persisted course.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub subject_name: String,
    pub topic: String,
    pub duration: u32,
    pub author: String,
    pub created_at: String,
}

impl From<CourseRecord> for CourseResponse {
    fn from(record: CourseRecord) -> Self {
        Self {
            id: record.id.as_uuid().to_string(),
            name: record.name,
            subject: record.subject.as_str().to_string(),
            subject_name: record.subject.display_name().to_string(),
            topic: record.topic,
            duration: record.duration,
            author: record.author.to_string(),
            created_at: record.created_at.to_iso8601(),
        }
    }
}

/// One page of courses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseListResponse {
    pub courses: Vec<CourseResponse>,
    pub page: u32,
    pub limit: u32,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/courses", get(list_courses).post(create_course))
}

/// POST /v1/courses: Create a course authored by the caller.
#[utoipa::path(
    post,
    path = "/v1/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 401, description = "User not authenticated", body = crate::error::ErrorBody),
        (status = 403, description = "Caller may not author courses", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 503, description = "Datastore unavailable", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "courses"
)]
pub(crate) async fn create_course(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateCourseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CourseResponse>), AppError> {
    require_role(&caller, Role::Instructor)?;
    let draft = CourseDraft::from(extract_json(body)?);
    let course = lms_courses::create_course(
        state.store.as_ref(),
        state.clock.as_ref(),
        caller.user_id.as_ref(),
        &draft,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(course.into())))
}

/// GET /v1/courses: List courses, newest first.
#[utoipa::path(
    get,
    path = "/v1/courses",
    params(ListCoursesParams),
    responses(
        (status = 200, description = "One page of courses", body = CourseListResponse),
        (status = 400, description = "Malformed query", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown subject", body = crate::error::ErrorBody),
        (status = 503, description = "Datastore unavailable", body = crate::error::ErrorBody),
    ),
    tag = "courses"
)]
pub(crate) async fn list_courses(
    State(state): State<AppState>,
    params: Result<Query<ListCoursesParams>, QueryRejection>,
) -> Result<Json<CourseListResponse>, AppError> {
    let query = extract_query(params)?.into_query()?;
    let courses = lms_courses::list_courses(state.store.as_ref(), &query).await?;
    Ok(Json(CourseListResponse {
        courses: courses.into_iter().map(CourseResponse::from).collect(),
        page: query.page.unwrap_or(1).max(1),
        limit: query.page_size(),
    }))
}
