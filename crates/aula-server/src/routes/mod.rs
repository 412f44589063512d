pub mod announcements;
pub mod files;
pub mod health;
pub mod lesson_plans;
pub mod observations;
pub mod periods;
pub mod projects;
pub mod session;
pub mod structure;
pub mod students;
pub mod users;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, http::HeaderValue, middleware, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use aula_core::attachment::MAX_UPLOAD_BYTES;
use aula_service::AcademicService;

use crate::auth::auth_middleware;

/// Larger than any accepted upload so oversize files reach the upload
/// checks and get a descriptive error.
const BODY_LIMIT_BYTES: usize = MAX_UPLOAD_BYTES + 6 * 1024 * 1024;

pub struct InnerAppState {
    pub service: AcademicService,
}

pub type AppState = Arc<InnerAppState>;

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let public = Router::new()
        .merge(health::routes())
        .merge(session::public_routes())
        .merge(files::routes());

    let protected = Router::new()
        .merge(session::routes())
        .merge(users::routes())
        .merge(structure::routes())
        .merge(students::routes())
        .merge(periods::routes())
        .merge(lesson_plans::routes())
        .merge(projects::routes())
        .merge(observations::routes())
        .merge(announcements::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public
        .merge(protected)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Any origin when the list is empty, otherwise exactly the listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_headers(Any).allow_methods(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.trim().parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
