//! Google Drive backend over the v3 REST API.
//!
//! Access tokens come from an OAuth refresh token and are cached until
//! shortly before expiry. Logical folders such as `projects/evidence` map to
//! nested Drive folders under the configured root, created on first use.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{DriveConfig, ObjectStore, Removal, StoreError, StoredObject, UploadRequest};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// Refresh this long before the token actually expires.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct DriveStore {
    client: Client,
    config: DriveConfig,
    token: Mutex<Option<CachedToken>>,
    /// Logical folder path → Drive folder id.
    folders: Mutex<HashMap<String, String>>,
}

impl std::fmt::Debug for DriveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveStore")
            .field("folder_id", &self.config.folder_id)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Deserialize)]
struct FileRef {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    web_view_link: Option<String>,
    /// Drive encodes int64 as a string.
    #[serde(default)]
    size: Option<String>,
}

fn http_err(context: &str, e: reqwest::Error) -> StoreError {
    StoreError::Internal(format!("drive {context}: {e}"))
}

async fn status_err(context: &str, resp: reqwest::Response) -> StoreError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    StoreError::Internal(format!("drive {context}: {status}: {body}"))
}

/// Drive query for a child folder by name. Single quotes and backslashes
/// are escaped per the Drive query grammar.
fn folder_query(name: &str, parent_id: &str) -> String {
    let escape = |s: &str| s.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{FOLDER_MIME}' and '{}' in parents and trashed = false",
        escape(name),
        escape(parent_id)
    )
}

/// `(view, embed, download)` links for a Drive file id.
fn drive_links(file_id: &str, web_view_link: Option<String>) -> (String, String, String) {
    let view = web_view_link
        .unwrap_or_else(|| format!("https://drive.google.com/file/d/{file_id}/view"));
    (
        view,
        format!("https://drive.google.com/file/d/{file_id}/preview"),
        format!("https://drive.google.com/uc?export=download&id={file_id}"),
    )
}

impl DriveStore {
    pub fn new(config: &DriveConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent("aula-store")
            .build()
            .map_err(|e| StoreError::Internal(format!("HTTP client init: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
            token: Mutex::new(None),
            folders: Mutex::new(HashMap::new()),
        })
    }

    fn root_folder(&self) -> Result<&str, StoreError> {
        self.config
            .folder_id
            .as_deref()
            .ok_or_else(|| StoreError::NotConfigured("drive folder id missing".into()))
    }

    async fn access_token(&self) -> Result<String, StoreError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_SLACK < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let (Some(client_id), Some(client_secret), Some(refresh_token)) = (
            self.config.client_id.as_deref(),
            self.config.client_secret.as_deref(),
            self.config.refresh_token.as_deref(),
        ) else {
            return Err(StoreError::NotConfigured(
                "drive OAuth client id, secret and refresh token are required".into(),
            ));
        };

        let resp = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| http_err("token refresh", e))?;
        if !resp.status().is_success() {
            return Err(status_err("token refresh", resp).await);
        }
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| http_err("token response", e))?;

        let ttl = Duration::from_secs(token.expires_in.unwrap_or(3600));
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + ttl,
        });
        debug!("refreshed drive access token");
        Ok(token.access_token)
    }

    /// Resolve (creating as needed) the Drive folder for a logical path.
    async fn folder_id(&self, token: &str, path: &str) -> Result<String, StoreError> {
        let path = path.trim_matches('/');
        let root = self.root_folder()?.to_string();
        if path.is_empty() {
            return Ok(root);
        }

        let mut folders = self.folders.lock().await;
        if let Some(id) = folders.get(path) {
            return Ok(id.clone());
        }

        let mut parent = root;
        let mut walked = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !walked.is_empty() {
                walked.push('/');
            }
            walked.push_str(segment);
            parent = match folders.get(&walked) {
                Some(id) => id.clone(),
                None => {
                    let id = self.find_or_create_folder(token, segment, &parent).await?;
                    folders.insert(walked.clone(), id.clone());
                    id
                }
            };
        }
        Ok(parent)
    }

    async fn find_or_create_folder(
        &self,
        token: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<String, StoreError> {
        let resp = self
            .client
            .get(format!("{API_BASE}/files"))
            .bearer_auth(token)
            .query(&[
                ("q", folder_query(name, parent_id).as_str()),
                ("spaces", "drive"),
                ("fields", "files(id, name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await
            .map_err(|e| http_err("folder lookup", e))?;
        if !resp.status().is_success() {
            return Err(status_err("folder lookup", resp).await);
        }
        let list: FileList = resp
            .json()
            .await
            .map_err(|e| http_err("folder lookup", e))?;
        if let Some(existing) = list.files.into_iter().next() {
            return Ok(existing.id);
        }

        let resp = self
            .client
            .post(format!("{API_BASE}/files"))
            .bearer_auth(token)
            .query(&[("fields", "id"), ("supportsAllDrives", "true")])
            .json(&serde_json::json!({
                "name": name,
                "mimeType": FOLDER_MIME,
                "parents": [parent_id],
            }))
            .send()
            .await
            .map_err(|e| http_err("folder create", e))?;
        if !resp.status().is_success() {
            return Err(status_err("folder create", resp).await);
        }
        let created: FileRef = resp
            .json()
            .await
            .map_err(|e| http_err("folder create", e))?;
        debug!(folder = name, id = %created.id, "created drive folder");
        Ok(created.id)
    }

    /// Grant "anyone with the link" read access so embeds work.
    async fn make_public(&self, token: &str, file_id: &str) -> Result<(), StoreError> {
        let resp = self
            .client
            .post(format!("{API_BASE}/files/{file_id}/permissions"))
            .bearer_auth(token)
            .query(&[("supportsAllDrives", "true")])
            .json(&serde_json::json!({ "type": "anyone", "role": "reader" }))
            .send()
            .await
            .map_err(|e| http_err("permission", e))?;
        if !resp.status().is_success() {
            return Err(status_err("permission", resp).await);
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for DriveStore {
    fn backend_name(&self) -> &'static str {
        "drive"
    }

    fn is_configured(&self) -> bool {
        self.config.is_complete()
    }

    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, StoreError> {
        if !self.is_configured() {
            return Err(StoreError::NotConfigured(
                "Google Drive credentials or folder id missing".into(),
            ));
        }
        let token = self.access_token().await?;
        let parent = self.folder_id(&token, &request.folder).await?;

        // Resumable upload: open a session, then send the bytes to it.
        let resp = self
            .client
            .post(format!("{UPLOAD_BASE}/files"))
            .bearer_auth(&token)
            .query(&[
                ("uploadType", "resumable"),
                ("supportsAllDrives", "true"),
                ("fields", "id, name, webViewLink, size"),
            ])
            .header("X-Upload-Content-Type", request.content_type.as_str())
            .header("X-Upload-Content-Length", request.data.len().to_string())
            .json(&serde_json::json!({ "name": request.filename, "parents": [parent] }))
            .send()
            .await
            .map_err(|e| http_err("upload session", e))?;
        if !resp.status().is_success() {
            return Err(status_err("upload session", resp).await);
        }
        let session_url = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| StoreError::Internal("drive upload session: no Location".into()))?;

        let size = request.data.len();
        let resp = self
            .client
            .put(&session_url)
            .header(reqwest::header::CONTENT_TYPE, request.content_type.as_str())
            .body(request.data)
            .send()
            .await
            .map_err(|e| http_err("upload", e))?;
        if !resp.status().is_success() {
            return Err(status_err("upload", resp).await);
        }
        let file: UploadedFile = resp.json().await.map_err(|e| http_err("upload", e))?;

        if let Err(e) = self.make_public(&token, &file.id).await {
            warn!(file_id = %file.id, error = %e, "could not make drive file public");
        }

        let (view_link, embed_link, download_link) = drive_links(&file.id, file.web_view_link);
        let size_bytes = file
            .size
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(size as i64);
        Ok(StoredObject {
            remote_id: file.id,
            filename: file.name.unwrap_or(request.filename),
            view_link,
            embed_link,
            download_link,
            size_bytes,
        })
    }

    async fn delete(&self, remote_id: &str) -> Result<Removal, StoreError> {
        let token = self.access_token().await?;
        let resp = self
            .client
            .delete(format!("{API_BASE}/files/{remote_id}"))
            .bearer_auth(&token)
            .query(&[("supportsAllDrives", "true")])
            .send()
            .await
            .map_err(|e| http_err("delete", e))?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(Removal::NotFound),
            s if s.is_success() => Ok(Removal::Deleted),
            _ => Err(status_err("delete", resp).await),
        }
    }

    async fn get(&self, remote_id: &str) -> Result<Bytes, StoreError> {
        let token = self.access_token().await?;
        let resp = self
            .client
            .get(format!("{API_BASE}/files/{remote_id}"))
            .bearer_auth(&token)
            .query(&[("alt", "media"), ("supportsAllDrives", "true")])
            .send()
            .await
            .map_err(|e| http_err("download", e))?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(remote_id.to_string())),
            s if s.is_success() => resp.bytes().await.map_err(|e| http_err("download", e)),
            _ => Err(status_err("download", resp).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> DriveConfig {
        DriveConfig {
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            refresh_token: Some("refresh".into()),
            folder_id: Some("root".into()),
        }
    }

    #[test]
    fn configured_only_when_complete() {
        assert!(DriveStore::new(&complete()).unwrap().is_configured());

        let mut partial = complete();
        partial.folder_id = None;
        assert!(!DriveStore::new(&partial).unwrap().is_configured());
    }

    #[tokio::test]
    async fn upload_without_config_fails_before_any_request() {
        let store = DriveStore::new(&DriveConfig::default()).unwrap();
        let err = store
            .upload(UploadRequest {
                data: Bytes::from_static(b"x"),
                filename: "a.pdf".into(),
                content_type: "application/pdf".into(),
                folder: "lesson-plans".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn token_requires_credentials() {
        let store = DriveStore::new(&DriveConfig {
            folder_id: Some("root".into()),
            ..Default::default()
        })
        .unwrap();
        let err = store.access_token().await.unwrap_err();
        assert!(matches!(err, StoreError::NotConfigured(_)));
    }

    #[test]
    fn folder_query_escapes_quotes() {
        let q = folder_query("Plan's", "abc");
        assert!(q.contains("name = 'Plan\\'s'"));
        assert!(q.contains("'abc' in parents"));
        assert!(q.contains("trashed = false"));
    }

    #[test]
    fn links_follow_drive_url_scheme() {
        let (view, embed, download) = drive_links("F1", None);
        assert_eq!(view, "https://drive.google.com/file/d/F1/view");
        assert_eq!(embed, "https://drive.google.com/file/d/F1/preview");
        assert_eq!(download, "https://drive.google.com/uc?export=download&id=F1");

        let (view, _, _) = drive_links("F1", Some("https://drive.google.com/x".into()));
        assert_eq!(view, "https://drive.google.com/x");
    }
}
