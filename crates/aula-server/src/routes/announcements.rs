use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use aula_core::announcement::{CreateAnnouncement, UpdateAnnouncement};

use crate::auth::CurrentUser;
use crate::error::{to_error, ApiError};
use crate::form::MultipartForm;

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route(
            "/api/announcements/{id}",
            get(get_announcement)
                .patch(update_announcement)
                .delete(delete_announcement),
        )
}

async fn list_announcements(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_announcements()
        .await
        .map(|a| Json(json!(a)))
        .map_err(to_error)
}

async fn get_announcement(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_announcement(id)
        .await
        .map(|a| Json(json!(a)))
        .map_err(to_error)
}

async fn create_announcement(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let input = CreateAnnouncement {
        title: form.require_text("title")?,
        content: form.require_text("content")?,
    };
    let file = form.take_file();
    state
        .service
        .create_announcement(&current.user, &input, file)
        .await
        .map(|a| (StatusCode::CREATED, Json(json!(a))))
        .map_err(to_error)
}

async fn update_announcement(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let update = UpdateAnnouncement {
        title: form.text("title"),
        content: form.text("content"),
    };
    let remove_file = form.flag("remove_file");
    let file = form.take_file();
    state
        .service
        .update_announcement(&current.user, id, &update, file, remove_file)
        .await
        .map(|a| Json(json!(a)))
        .map_err(to_error)
}

async fn delete_announcement(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_announcement(&current.user, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}
