use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use aula_core::student::{CreateStudent, UpdateStudent};

use crate::auth::CurrentUser;
use crate::error::{to_error, ApiError};

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/students", get(list_students).post(create_student))
        .route(
            "/api/students/{id}",
            get(get_student).patch(update_student).delete(delete_student),
        )
        .route(
            "/api/students/{id}/observations/current",
            get(current_observations),
        )
        .route(
            "/api/students/{id}/observations/history",
            get(observation_history),
        )
}

#[derive(Debug, Deserialize)]
struct StudentQuery {
    group_id: Option<i64>,
}

async fn list_students(
    State(state): State<AppState>,
    Query(q): Query<StudentQuery>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_students(q.group_id)
        .await
        .map(|s| Json(json!(s)))
        .map_err(to_error)
}

async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_student(id)
        .await
        .map(|s| Json(json!(s)))
        .map_err(to_error)
}

async fn create_student(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<CreateStudent>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .service
        .create_student(&current.user, &input)
        .await
        .map(|s| (StatusCode::CREATED, Json(json!(s))))
        .map_err(to_error)
}

async fn update_student(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateStudent>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .update_student(&current.user, id, &update)
        .await
        .map(|s| Json(json!(s)))
        .map_err(to_error)
}

async fn delete_student(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_student(&current.user, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

async fn current_observations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .current_observations(id)
        .await
        .map(|o| Json(json!(o)))
        .map_err(to_error)
}

async fn observation_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .observation_history(id)
        .await
        .map(|o| Json(json!(o)))
        .map_err(to_error)
}
