use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use aula_core::user::{CreateUser, UpdateUser, UserFilter};

use crate::auth::CurrentUser;
use crate::error::{to_error, ApiError};

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}", get(get_user).patch(update_user))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_users(&current.user, &filter)
        .await
        .map(|u| Json(json!(u)))
        .map_err(to_error)
}

async fn get_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_user(&current.user, id)
        .await
        .map(|u| Json(json!(u)))
        .map_err(to_error)
}

async fn create_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .service
        .create_user(&current.user, &input)
        .await
        .map(|u| (StatusCode::CREATED, Json(json!(u))))
        .map_err(to_error)
}

async fn update_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateUser>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .update_user(&current.user, id, &update)
        .await
        .map(|u| Json(json!(u)))
        .map_err(to_error)
}
