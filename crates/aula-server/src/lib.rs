pub mod auth;
pub mod config;
mod error;
mod form;
mod routes;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use routes::{build_router, AppState, InnerAppState};

use anyhow::Result;
use tokio::net::TcpListener;

pub async fn serve(listener: TcpListener, state: AppState, cors_origins: &[String]) -> Result<()> {
    let app = build_router(state, cors_origins);
    axum::serve(listener, app).await?;
    Ok(())
}
