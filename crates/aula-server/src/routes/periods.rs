use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use aula_core::period::UpdatePeriod;

use crate::auth::CurrentUser;
use crate::error::{to_error, ApiError};

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/periods", get(list_periods))
        .route("/api/periods/active", get(active_period))
        .route("/api/periods/{id}", get(get_period).patch(update_period))
}

async fn list_periods(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_periods()
        .await
        .map(|p| Json(json!(p)))
        .map_err(to_error)
}

async fn active_period(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .service
        .active_period()
        .await
        .map(|p| Json(json!(p)))
        .map_err(to_error)
}

async fn get_period(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_period(id)
        .await
        .map(|p| Json(json!(p)))
        .map_err(to_error)
}

async fn update_period(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<UpdatePeriod>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .update_period(&current.user, id, &update)
        .await
        .map(|p| Json(json!(p)))
        .map_err(to_error)
}
