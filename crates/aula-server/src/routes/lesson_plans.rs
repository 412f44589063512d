//! Lesson plans, their comments and the featured-plan showcase.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use aula_core::featured_plan::{CreateFeaturedPlan, UpdateFeaturedPlan};
use aula_core::lesson_plan::{CreateLessonPlan, LessonPlanFilter, UpdateLessonPlan};
use aula_core::plan_comment::{CreatePlanComment, PlanCommentFilter, UpdatePlanComment};

use crate::auth::CurrentUser;
use crate::error::{to_error, ApiError};
use crate::form::MultipartForm;

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/lesson-plans",
            get(list_lesson_plans).post(create_lesson_plan),
        )
        .route("/api/lesson-plans/mine", get(my_lesson_plans))
        .route(
            "/api/lesson-plans/{id}",
            get(get_lesson_plan)
                .patch(update_lesson_plan)
                .delete(delete_lesson_plan),
        )
        .route("/api/lesson-plans/{id}/comments", get(comments_for_plan))
        .route(
            "/api/plan-comments",
            get(list_plan_comments).post(create_plan_comment),
        )
        .route(
            "/api/plan-comments/{id}",
            get(get_plan_comment)
                .patch(update_plan_comment)
                .delete(delete_plan_comment),
        )
        .route(
            "/api/featured-plans",
            get(list_featured_plans).post(create_featured_plan),
        )
        .route(
            "/api/featured-plans/{id}",
            get(get_featured_plan)
                .patch(update_featured_plan)
                .delete(delete_featured_plan),
        )
        .route("/api/featured-plans/{id}/views", patch(record_view))
}

// -- Lesson plans --

async fn list_lesson_plans(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(filter): Query<LessonPlanFilter>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_lesson_plans(&current.user, &filter)
        .await
        .map(|p| Json(json!(p)))
        .map_err(to_error)
}

#[derive(Debug, Deserialize)]
struct MineQuery {
    period_id: Option<i64>,
}

async fn my_lesson_plans(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(q): Query<MineQuery>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .my_lesson_plans(&current.user, q.period_id)
        .await
        .map(|p| Json(json!(p)))
        .map_err(to_error)
}

async fn get_lesson_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_lesson_plan(id)
        .await
        .map(|p| Json(json!(p)))
        .map_err(to_error)
}

/// Multipart: `subject_id`, `title` and a required `file`.
async fn create_lesson_plan(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let input = CreateLessonPlan {
        subject_id: form.require("subject_id")?,
        title: form.require_text("title")?,
    };
    let file = form.require_file()?;
    state
        .service
        .create_lesson_plan(&current.user, &input, file)
        .await
        .map(|p| (StatusCode::CREATED, Json(json!(p))))
        .map_err(to_error)
}

/// Multipart: optional `title`, `subject_id`, `period_id` and `file`.
async fn update_lesson_plan(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let update = UpdateLessonPlan {
        title: form.text("title"),
        subject_id: form.field("subject_id")?,
        period_id: form.field("period_id")?,
    };
    let file = form.take_file();
    state
        .service
        .update_lesson_plan(&current.user, id, &update, file)
        .await
        .map(|p| Json(json!(p)))
        .map_err(to_error)
}

async fn delete_lesson_plan(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_lesson_plan(&current.user, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

async fn comments_for_plan(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_comments_for_plan(&current.user, id)
        .await
        .map(|c| Json(json!(c)))
        .map_err(to_error)
}

// -- Plan comments --

async fn list_plan_comments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(filter): Query<PlanCommentFilter>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_plan_comments(&current.user, &filter)
        .await
        .map(|c| Json(json!(c)))
        .map_err(to_error)
}

async fn get_plan_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_plan_comment(id)
        .await
        .map(|c| Json(json!(c)))
        .map_err(to_error)
}

async fn create_plan_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<CreatePlanComment>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .service
        .create_plan_comment(&current.user, &input)
        .await
        .map(|c| (StatusCode::CREATED, Json(json!(c))))
        .map_err(to_error)
}

async fn update_plan_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<UpdatePlanComment>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .update_plan_comment(&current.user, id, &update.content)
        .await
        .map(|c| Json(json!(c)))
        .map_err(to_error)
}

async fn delete_plan_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_plan_comment(&current.user, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

// -- Featured plans --

#[derive(Debug, Deserialize)]
struct FeaturedQuery {
    only_active: Option<bool>,
}

async fn list_featured_plans(
    State(state): State<AppState>,
    Query(q): Query<FeaturedQuery>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_featured_plans(q.only_active.unwrap_or(true))
        .await
        .map(|f| Json(json!(f)))
        .map_err(to_error)
}

async fn get_featured_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_featured_plan(id)
        .await
        .map(|f| Json(json!(f)))
        .map_err(to_error)
}

async fn create_featured_plan(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<CreateFeaturedPlan>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .service
        .create_featured_plan(&current.user, &input)
        .await
        .map(|f| (StatusCode::CREATED, Json(json!(f))))
        .map_err(to_error)
}

async fn update_featured_plan(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateFeaturedPlan>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .update_featured_plan(&current.user, id, &update)
        .await
        .map(|f| Json(json!(f)))
        .map_err(to_error)
}

async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .record_featured_view(id)
        .await
        .map(|f| Json(json!(f)))
        .map_err(to_error)
}

async fn delete_featured_plan(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_featured_plan(&current.user, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}
