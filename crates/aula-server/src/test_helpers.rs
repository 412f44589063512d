use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

use aula_core::user::CreateUser;
use aula_core::Role;
use aula_service::AcademicService;
use aula_store::StoreConfig;

use crate::routes::{build_router, AppState, InnerAppState};

pub const PRINCIPAL_NATIONAL_ID: &str = "1000001";
pub const PRINCIPAL_PASSWORD: &str = "principal-pass";

/// In-memory SQLite, a temp-dir local store and one seeded principal.
pub async fn test_state_with_url(public_base_url: &str) -> AppState {
    let db = Arc::new(aula_db::SqliteDatabase::open_in_memory().unwrap());
    let store_config = StoreConfig {
        local_data_dir: Some(
            tempfile::tempdir()
                .unwrap()
                .keep()
                .to_string_lossy()
                .to_string(),
        ),
        public_base_url: Some(public_base_url.to_string()),
        ..Default::default()
    };
    let store = aula_store::create_store(&store_config).unwrap();
    let service = AcademicService::new(db, store);
    service
        .bootstrap_user(&CreateUser {
            email: "principal@school.test".into(),
            full_name: "School Principal".into(),
            national_id: PRINCIPAL_NATIONAL_ID.into(),
            password: PRINCIPAL_PASSWORD.into(),
            role: Role::Principal,
            active: true,
            phone: None,
            site_id: None,
        })
        .await
        .unwrap();
    Arc::new(InnerAppState { service })
}

pub async fn test_state() -> AppState {
    test_state_with_url("http://localhost:8000").await
}

pub async fn test_router() -> Router {
    build_router(test_state().await, &[])
}

/// Log in through the router and return the bearer token.
pub async fn login_token(app: &Router, national_id: &str, password: &str) -> String {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "national_id": national_id, "password": password })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(resp.status().is_success(), "login failed: {}", resp.status());
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let session: Value = serde_json::from_slice(&body).unwrap();
    session["token"].as_str().unwrap().to_string()
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn the API on a random port. File links point back at this server.
pub async fn spawn_test_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let state = test_state_with_url(&base_url).await;
    let app = build_router(state.clone(), &[]);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        state,
        _handle: handle,
    }
}
