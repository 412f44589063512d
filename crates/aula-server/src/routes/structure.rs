//! Sites, areas, subjects, grades and groups.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use aula_core::area::{CreateArea, UpdateArea};
use aula_core::grade::{CreateGrade, UpdateGrade};
use aula_core::group::{CreateGroup, UpdateGroup};
use aula_core::site::{CreateSite, UpdateSite};
use aula_core::subject::{CreateSubject, SubjectFilter, UpdateSubject};

use crate::auth::CurrentUser;
use crate::error::{to_error, ApiError};

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/sites", get(list_sites).post(create_site))
        .route(
            "/api/sites/{id}",
            get(get_site).patch(update_site).delete(delete_site),
        )
        .route("/api/areas", get(list_areas).post(create_area))
        .route(
            "/api/areas/{id}",
            get(get_area).patch(update_area).delete(delete_area),
        )
        .route("/api/subjects", get(list_subjects).post(create_subject))
        .route(
            "/api/subjects/{id}",
            get(get_subject).patch(update_subject).delete(delete_subject),
        )
        .route("/api/subjects/{id}/teachers", post(assign_subject_teacher))
        .route(
            "/api/subjects/{id}/teachers/{teacher_id}",
            delete(unassign_subject_teacher),
        )
        .route("/api/grades", get(list_grades).post(create_grade))
        .route(
            "/api/grades/{id}",
            get(get_grade).patch(update_grade).delete(delete_grade),
        )
        .route("/api/groups", get(list_groups).post(create_group))
        .route(
            "/api/groups/{id}",
            get(get_group).patch(update_group).delete(delete_group),
        )
        .route("/api/groups/{id}/directors", post(assign_group_director))
        .route(
            "/api/groups/{id}/directors/{teacher_id}",
            delete(unassign_group_director),
        )
}

#[derive(Debug, Deserialize)]
struct TeacherAssignment {
    teacher_id: i64,
}

// -- Sites --

async fn list_sites(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_sites()
        .await
        .map(|s| Json(json!(s)))
        .map_err(to_error)
}

async fn get_site(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_site(id)
        .await
        .map(|s| Json(json!(s)))
        .map_err(to_error)
}

async fn create_site(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<CreateSite>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .service
        .create_site(&current.user, &input)
        .await
        .map(|s| (StatusCode::CREATED, Json(json!(s))))
        .map_err(to_error)
}

async fn update_site(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateSite>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .update_site(&current.user, id, &update)
        .await
        .map(|s| Json(json!(s)))
        .map_err(to_error)
}

async fn delete_site(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_site(&current.user, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

// -- Areas --

async fn list_areas(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_areas()
        .await
        .map(|a| Json(json!(a)))
        .map_err(to_error)
}

async fn get_area(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_area(id)
        .await
        .map(|a| Json(json!(a)))
        .map_err(to_error)
}

async fn create_area(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<CreateArea>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .service
        .create_area(&current.user, &input)
        .await
        .map(|a| (StatusCode::CREATED, Json(json!(a))))
        .map_err(to_error)
}

async fn update_area(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateArea>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .update_area(&current.user, id, &update)
        .await
        .map(|a| Json(json!(a)))
        .map_err(to_error)
}

async fn delete_area(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_area(&current.user, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

// -- Subjects --

async fn list_subjects(
    State(state): State<AppState>,
    Query(filter): Query<SubjectFilter>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_subjects(&filter)
        .await
        .map(|s| Json(json!(s)))
        .map_err(to_error)
}

async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_subject(id)
        .await
        .map(|s| Json(json!(s)))
        .map_err(to_error)
}

async fn create_subject(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<CreateSubject>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .service
        .create_subject(&current.user, &input)
        .await
        .map(|s| (StatusCode::CREATED, Json(json!(s))))
        .map_err(to_error)
}

async fn update_subject(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateSubject>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .update_subject(&current.user, id, &update)
        .await
        .map(|s| Json(json!(s)))
        .map_err(to_error)
}

async fn delete_subject(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_subject(&current.user, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

async fn assign_subject_teacher(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(input): Json<TeacherAssignment>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .assign_subject_teacher(&current.user, id, input.teacher_id)
        .await
        .map(|_| StatusCode::CREATED)
        .map_err(to_error)
}

async fn unassign_subject_teacher(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((id, teacher_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .unassign_subject_teacher(&current.user, id, teacher_id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

// -- Grades --

#[derive(Debug, Deserialize)]
struct GradeQuery {
    site_id: Option<i64>,
}

async fn list_grades(
    State(state): State<AppState>,
    Query(q): Query<GradeQuery>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_grades(q.site_id)
        .await
        .map(|g| Json(json!(g)))
        .map_err(to_error)
}

async fn get_grade(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_grade(id)
        .await
        .map(|g| Json(json!(g)))
        .map_err(to_error)
}

async fn create_grade(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<CreateGrade>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .service
        .create_grade(&current.user, &input)
        .await
        .map(|g| (StatusCode::CREATED, Json(json!(g))))
        .map_err(to_error)
}

async fn update_grade(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateGrade>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .update_grade(&current.user, id, &update)
        .await
        .map(|g| Json(json!(g)))
        .map_err(to_error)
}

async fn delete_grade(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_grade(&current.user, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

// -- Groups --

#[derive(Debug, Deserialize)]
struct GroupQuery {
    grade_id: Option<i64>,
}

async fn list_groups(
    State(state): State<AppState>,
    Query(q): Query<GroupQuery>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_groups(q.grade_id)
        .await
        .map(|g| Json(json!(g)))
        .map_err(to_error)
}

async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_group(id)
        .await
        .map(|g| Json(json!(g)))
        .map_err(to_error)
}

async fn create_group(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<CreateGroup>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .service
        .create_group(&current.user, &input)
        .await
        .map(|g| (StatusCode::CREATED, Json(json!(g))))
        .map_err(to_error)
}

async fn update_group(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateGroup>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .update_group(&current.user, id, &update)
        .await
        .map(|g| Json(json!(g)))
        .map_err(to_error)
}

async fn delete_group(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_group(&current.user, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

async fn assign_group_director(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(input): Json<TeacherAssignment>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .assign_group_director(&current.user, id, input.teacher_id)
        .await
        .map(|_| StatusCode::CREATED)
        .map_err(to_error)
}

async fn unassign_group_director(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((id, teacher_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .unassign_group_director(&current.user, id, teacher_id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::test_helpers::{login_token, test_router, PRINCIPAL_NATIONAL_ID, PRINCIPAL_PASSWORD};

    fn post_json(uri: &str, token: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn create_and_fetch_site() {
        let app = test_router().await;
        let token = login_token(&app, PRINCIPAL_NATIONAL_ID, PRINCIPAL_PASSWORD).await;

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/sites",
                &token,
                r#"{"name":"North campus","code":"NORTH"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let site: Value = serde_json::from_slice(&body).unwrap();
        let id = site["id"].as_i64().unwrap();
        assert_eq!(site["active"], true);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/sites/{id}"))
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_site_code_conflicts() {
        let app = test_router().await;
        let token = login_token(&app, PRINCIPAL_NATIONAL_ID, PRINCIPAL_PASSWORD).await;
        let body = r#"{"name":"South campus","code":"SOUTH"}"#;

        let first = app
            .clone()
            .oneshot(post_json("/api/sites", &token, body))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .oneshot(post_json(
                "/api/sites",
                &token,
                r#"{"name":"Another campus","code":"SOUTH"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn missing_subject_is_not_found() {
        let app = test_router().await;
        let token = login_token(&app, PRINCIPAL_NATIONAL_ID, PRINCIPAL_PASSWORD).await;
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/subjects/9999")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
