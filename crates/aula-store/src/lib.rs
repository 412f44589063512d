#[cfg(feature = "drive")]
mod drive;
mod local;
mod memory;
#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "drive")]
pub use drive::DriveStore;
pub use local::LocalStore;
pub use memory::MemoryStore;
#[cfg(feature = "s3")]
pub use s3::S3Store;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend lacks credentials or a destination.
    #[error("storage not configured: {0}")]
    NotConfigured(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("store error: {0}")]
    Internal(String),
}

/// An upload as handed to a backend. `folder` is a logical path such as
/// `projects/evidence`.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Bytes,
    pub filename: String,
    pub content_type: String,
    pub folder: String,
}

/// What a backend reports after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub remote_id: String,
    /// The client's name for the file, unchanged. Only the key is sanitized.
    pub filename: String,
    pub view_link: String,
    pub embed_link: String,
    pub download_link: String,
    pub size_bytes: i64,
}

/// Outcome of a delete that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Deleted,
    /// The object was already gone.
    NotFound,
}

/// Remote storage for attachment files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short name for logs, e.g. "local" or "drive".
    fn backend_name(&self) -> &'static str;

    /// Whether the backend has what it needs to accept uploads.
    fn is_configured(&self) -> bool {
        true
    }

    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, StoreError>;

    async fn delete(&self, remote_id: &str) -> Result<Removal, StoreError>;

    /// Read an object back. Returns `StoreError::NotFound` if absent.
    async fn get(&self, remote_id: &str) -> Result<Bytes, StoreError>;
}

// -- Key helpers --

/// Reduce a client-supplied file name to a single safe path segment.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// `<folder>/<uuid>/<filename>`
pub fn object_key(folder: &str, filename: &str) -> String {
    let folder = folder.trim_matches('/');
    let id = uuid::Uuid::new_v4();
    if folder.is_empty() {
        format!("{id}/{filename}")
    } else {
        format!("{folder}/{id}/{filename}")
    }
}

/// Reject keys that could escape the store's namespace.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// View, embed and download links for an object served by the API's
/// `/api/files/{*key}` route.
pub fn served_links(public_base_url: &str, key: &str) -> (String, String, String) {
    let base = public_base_url.trim_end_matches('/');
    let view = format!("{base}/api/files/{key}");
    let download = format!("{view}?download=true");
    (view.clone(), view, download)
}

// -- Configuration --

/// Google Drive OAuth settings.
#[derive(Debug, Clone, Default)]
pub struct DriveConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    /// Root folder every upload lands under.
    pub folder_id: Option<String>,
}

impl DriveConfig {
    pub fn is_complete(&self) -> bool {
        self.client_id.is_some()
            && self.client_secret.is_some()
            && self.refresh_token.is_some()
            && self.folder_id.is_some()
    }

    fn is_present(&self) -> bool {
        self.client_id.is_some()
            || self.client_secret.is_some()
            || self.refresh_token.is_some()
            || self.folder_id.is_some()
    }
}

/// Configuration for the object store backend.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// S3-compatible endpoint URL (e.g., "http://127.0.0.1:3900").
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Local filesystem base directory (used when nothing remote is configured).
    pub local_data_dir: Option<String>,
    /// Externally reachable server URL, used to build links for objects the
    /// API serves itself.
    pub public_base_url: Option<String>,
    pub drive: DriveConfig,
}

fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|n| std::env::var(n).ok())
        .filter(|v| !v.is_empty())
}

impl StoreConfig {
    /// Build from environment variables. `AULA_*` names take precedence over
    /// the provider-standard `AWS_*` / `GOOGLE_*` ones.
    pub fn from_env() -> Self {
        Self {
            endpoint_url: env_any(&["AULA_S3_ENDPOINT", "AWS_ENDPOINT_URL"]),
            region: env_any(&["AULA_S3_REGION", "AWS_REGION"]),
            bucket: env_any(&["AULA_S3_BUCKET"]),
            access_key_id: env_any(&["AULA_S3_ACCESS_KEY_ID", "AWS_ACCESS_KEY_ID"]),
            secret_access_key: env_any(&["AULA_S3_SECRET_ACCESS_KEY", "AWS_SECRET_ACCESS_KEY"]),
            local_data_dir: env_any(&["AULA_DATA_DIR"]),
            public_base_url: env_any(&["AULA_PUBLIC_URL"]),
            drive: DriveConfig {
                client_id: env_any(&["AULA_DRIVE_CLIENT_ID", "GOOGLE_CLIENT_ID"]),
                client_secret: env_any(&["AULA_DRIVE_CLIENT_SECRET", "GOOGLE_CLIENT_SECRET"]),
                refresh_token: env_any(&["AULA_DRIVE_REFRESH_TOKEN", "GOOGLE_REFRESH_TOKEN"]),
                folder_id: env_any(&["AULA_DRIVE_FOLDER_ID", "GOOGLE_DRIVE_FOLDER_ID"]),
            },
        }
    }

    pub fn is_drive(&self) -> bool {
        self.drive.is_present()
    }

    pub fn is_s3(&self) -> bool {
        self.endpoint_url.is_some()
            && self.access_key_id.is_some()
            && self.secret_access_key.is_some()
            && self.bucket.is_some()
    }

    pub fn public_base_url(&self) -> &str {
        self.public_base_url
            .as_deref()
            .unwrap_or("http://localhost:8000")
    }

    pub fn local_dir(&self) -> PathBuf {
        self.local_data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_data_dir().join("files"))
    }
}

/// `$XDG_DATA_HOME/aula`, matching `aula_db::data_dir()` without depending
/// on the db crate.
fn default_data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("aula")
}

// -- Factory --

/// Create an `ObjectStore` from configuration: Drive, then S3, then local.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>, StoreError> {
    if config.is_drive() {
        #[cfg(feature = "drive")]
        {
            return Ok(Arc::new(DriveStore::new(&config.drive)?));
        }
        #[cfg(not(feature = "drive"))]
        {
            return Err(StoreError::Internal(
                "Drive configuration detected but the 'drive' feature is not enabled".into(),
            ));
        }
    }
    if config.is_s3() {
        #[cfg(feature = "s3")]
        {
            return Ok(Arc::new(S3Store::new(config)?));
        }
        #[cfg(not(feature = "s3"))]
        {
            return Err(StoreError::Internal(
                "S3 configuration detected but the 's3' feature is not enabled".into(),
            ));
        }
    }
    Ok(Arc::new(LocalStore::new(config)))
}
