//! Serves objects held by the local and S3 backends. Keys are
//! unguessable (`<folder>/<uuid>/<filename>`), so the route is public like
//! the links it backs.

use axum::{
    extract::{Path, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use aula_core::FileType;

use crate::error::{to_error, ApiError};

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/files/{*key}", get(get_file))
}

#[derive(Debug, Deserialize)]
struct FileQuery {
    #[serde(default)]
    download: bool,
}

async fn get_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(q): Query<FileQuery>,
) -> Result<Response, ApiError> {
    let data = state.service.fetch_file(&key).await.map_err(to_error)?;

    let filename = key.rsplit('/').next().unwrap_or(&key);
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type_for(filename)));
    if q.download {
        let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
        headers.insert(CONTENT_DISPOSITION, disposition);
    }
    Ok((headers, data).into_response())
}

fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let ext = if ext == "jpeg" { "jpg".to_string() } else { ext };
    FileType::parse_str(&ext)
        .map(|t| t.mime())
        .unwrap_or("application/octet-stream")
}
