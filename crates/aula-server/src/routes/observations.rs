use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};

use aula_core::observation::{CreateObservation, UpdateObservation};

use crate::auth::CurrentUser;
use crate::error::{to_error, ApiError};

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/observations", post(create_observation))
        .route(
            "/api/observations/{id}",
            get(get_observation)
                .put(update_observation)
                .delete(delete_observation),
        )
}

async fn create_observation(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<CreateObservation>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .service
        .create_observation(&current.user, &input)
        .await
        .map(|o| (StatusCode::CREATED, Json(json!(o))))
        .map_err(to_error)
}

async fn get_observation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_observation(id)
        .await
        .map(|o| Json(json!(o)))
        .map_err(to_error)
}

async fn update_observation(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateObservation>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .update_observation(&current.user, id, &update)
        .await
        .map(|o| Json(json!(o)))
        .map_err(to_error)
}

async fn delete_observation(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_observation(&current.user, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}
