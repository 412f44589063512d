use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::{to_error, ApiError};

use super::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/api/auth/login", post(login))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    national_id: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .login(&input.national_id, &input.password)
        .await
        .map(|s| Json(json!(s)))
        .map_err(to_error)
}

async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .logout(&current.token)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

async fn me(Extension(current): Extension<CurrentUser>) -> Json<Value> {
    Json(json!(current.user))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::test_helpers::{login_token, test_router, PRINCIPAL_NATIONAL_ID, PRINCIPAL_PASSWORD};

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = test_router().await;
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("Content-Type", "application/json")
                    .body(Body::from(format!(
                        r#"{{"national_id":"{PRINCIPAL_NATIONAL_ID}","password":"wrong-password"}}"#
                    )))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_revokes_token() {
        let app = test_router().await;
        let token = login_token(&app, PRINCIPAL_NATIONAL_ID, PRINCIPAL_PASSWORD).await;

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
