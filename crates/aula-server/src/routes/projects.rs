//! Classroom projects with their evidence and comments.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};

use aula_core::evidence::CreateEvidence;
use aula_core::project::{CreateProject, ProjectFilter, ProjectStatus, UpdateProject};
use aula_core::project_comment::{CreateProjectComment, UpdateProjectComment};

use crate::auth::CurrentUser;
use crate::error::{to_error, ApiError};
use crate::form::MultipartForm;

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).patch(update_project).delete(delete_project),
        )
        .route(
            "/api/projects/{id}/evidence",
            get(list_evidence).post(create_evidence),
        )
        .route(
            "/api/projects/{id}/evidence/{evidence_id}",
            delete(delete_evidence),
        )
        .route(
            "/api/projects/{id}/comments",
            get(list_project_comments).post(create_project_comment),
        )
        .route("/api/evidence/{id}/comments", get(list_evidence_comments))
        .route(
            "/api/project-comments/{id}",
            patch(update_project_comment).delete(delete_project_comment),
        )
}

// -- Projects --

async fn list_projects(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(filter): Query<ProjectFilter>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_projects(&current.user, &filter)
        .await
        .map(|p| Json(json!(p)))
        .map_err(to_error)
}

async fn get_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_project(&current.user, id)
        .await
        .map(|p| Json(json!(p)))
        .map_err(to_error)
}

/// Multipart: `title`, `description`, `starts_on`, optional `objectives`,
/// `estimated_end` and `file`.
async fn create_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let input = CreateProject {
        title: form.require_text("title")?,
        description: form.require_text("description")?,
        objectives: form.text("objectives"),
        starts_on: form.require::<NaiveDate>("starts_on")?,
        estimated_end: form.field::<NaiveDate>("estimated_end")?,
    };
    let file = form.take_file();
    state
        .service
        .create_project(&current.user, &input, file)
        .await
        .map(|p| (StatusCode::CREATED, Json(json!(p))))
        .map_err(to_error)
}

/// Multipart with every field optional. An empty `objectives` or
/// `estimated_end` clears it; `remove_file=true` drops the attachment.
async fn update_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let update = UpdateProject {
        title: form.text("title"),
        description: form.text("description"),
        objectives: form.nullable_text("objectives"),
        starts_on: form.field::<NaiveDate>("starts_on")?,
        estimated_end: form.nullable::<NaiveDate>("estimated_end")?,
        status: form.field::<ProjectStatus>("status")?,
    };
    let remove_file = form.flag("remove_file");
    let file = form.take_file();
    state
        .service
        .update_project(&current.user, id, &update, file, remove_file)
        .await
        .map(|p| Json(json!(p)))
        .map_err(to_error)
}

async fn delete_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_project(&current.user, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

// -- Evidence --

async fn list_evidence(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_evidence(&current.user, id)
        .await
        .map(|e| Json(json!(e)))
        .map_err(to_error)
}

/// Multipart: `title`, a required `file`, optional `description` and
/// `evidence_date`.
async fn create_evidence(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let input = CreateEvidence {
        title: form.require_text("title")?,
        description: form.text("description"),
        evidence_date: form.field::<NaiveDate>("evidence_date")?,
    };
    let file = form.require_file()?;
    state
        .service
        .create_evidence(&current.user, id, &input, file)
        .await
        .map(|e| (StatusCode::CREATED, Json(json!(e))))
        .map_err(to_error)
}

async fn delete_evidence(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((id, evidence_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_evidence(&current.user, id, evidence_id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

// -- Comments --

async fn list_project_comments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_project_comments(&current.user, id)
        .await
        .map(|c| Json(json!(c)))
        .map_err(to_error)
}

async fn list_evidence_comments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_evidence_comments(&current.user, id)
        .await
        .map(|c| Json(json!(c)))
        .map_err(to_error)
}

async fn create_project_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(input): Json<CreateProjectComment>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .service
        .create_project_comment(&current.user, id, &input)
        .await
        .map(|c| (StatusCode::CREATED, Json(json!(c))))
        .map_err(to_error)
}

async fn update_project_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateProjectComment>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .update_project_comment(&current.user, id, &update.content)
        .await
        .map(|c| Json(json!(c)))
        .map_err(to_error)
}

async fn delete_project_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_project_comment(&current.user, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}
