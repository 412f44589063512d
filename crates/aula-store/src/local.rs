use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::{
    object_key, sanitize_filename, served_links, validate_key, ObjectStore, Removal, StoreConfig,
    StoreError, StoredObject, UploadRequest,
};

/// Files on local disk, served back through the API.
pub struct LocalStore {
    base_dir: PathBuf,
    public_base_url: String,
}

impl LocalStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            base_dir: config.local_dir(),
            public_base_url: config.public_base_url().to_string(),
        }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.base_dir.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, StoreError> {
        let key = object_key(&request.folder, &sanitize_filename(&request.filename));
        let path = self.resolve(&key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Internal(format!("mkdir: {e}")))?;
        }
        tokio::fs::write(&path, &request.data)
            .await
            .map_err(|e| StoreError::Internal(format!("write {}: {e}", path.display())))?;
        debug!(key = %key, bytes = request.data.len(), "stored local object");

        let (view_link, embed_link, download_link) = served_links(&self.public_base_url, &key);
        Ok(StoredObject {
            remote_id: key,
            filename: request.filename,
            view_link,
            embed_link,
            download_link,
            size_bytes: request.data.len() as i64,
        })
    }

    async fn delete(&self, remote_id: &str) -> Result<Removal, StoreError> {
        let path = self.resolve(remote_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                // drop the per-object uuid directory; ignore if not empty
                if let Some(parent) = path.parent() {
                    let _ = tokio::fs::remove_dir(parent).await;
                }
                Ok(Removal::Deleted)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Removal::NotFound),
            Err(e) => Err(StoreError::Internal(format!(
                "delete {}: {e}",
                path.display()
            ))),
        }
    }

    async fn get(&self, remote_id: &str) -> Result<Bytes, StoreError> {
        let path = self.resolve(remote_id)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(remote_id.to_string()))
            }
            Err(e) => Err(StoreError::Internal(format!(
                "read {}: {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(dir: &std::path::Path) -> LocalStore {
        let config = StoreConfig {
            local_data_dir: Some(dir.to_string_lossy().to_string()),
            public_base_url: Some("http://aula.test".into()),
            ..Default::default()
        };
        LocalStore::new(&config)
    }

    fn request(folder: &str, name: &str, data: &'static [u8]) -> UploadRequest {
        UploadRequest {
            data: Bytes::from_static(data),
            filename: name.into(),
            content_type: "application/pdf".into(),
            folder: folder.into(),
        }
    }

    #[tokio::test]
    async fn upload_then_get_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        let stored = store
            .upload(request("lesson-plans", "plan.pdf", b"%PDF-1.7"))
            .await
            .unwrap();
        assert!(stored.remote_id.starts_with("lesson-plans/"));
        assert!(stored.remote_id.ends_with("/plan.pdf"));
        assert_eq!(stored.filename, "plan.pdf");
        assert_eq!(stored.size_bytes, 8);
        assert_eq!(
            stored.view_link,
            format!("http://aula.test/api/files/{}", stored.remote_id)
        );
        assert!(stored.download_link.ends_with("?download=true"));

        let data = store.get(&stored.remote_id).await.unwrap();
        assert_eq!(data.as_ref(), b"%PDF-1.7");
        assert!(tmp.path().join(&stored.remote_id).exists());
    }

    #[tokio::test]
    async fn same_name_twice_gets_distinct_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        let a = store.upload(request("projects", "a.pdf", b"one")).await.unwrap();
        let b = store.upload(request("projects", "a.pdf", b"two")).await.unwrap();
        assert_ne!(a.remote_id, b.remote_id);
        assert_eq!(store.get(&a.remote_id).await.unwrap().as_ref(), b"one");
    }

    #[tokio::test]
    async fn delete_reports_missing_objects() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        let stored = store.upload(request("announcements", "x.pdf", b"x")).await.unwrap();
        assert_eq!(store.delete(&stored.remote_id).await.unwrap(), Removal::Deleted);
        assert_eq!(store.delete(&stored.remote_id).await.unwrap(), Removal::NotFound);

        let err = store.get(&stored.remote_id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        let err = store.get("../outside.txt").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
        let err = store.delete("/etc/passwd").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn client_paths_in_filenames_are_flattened() {
        let tmp = tempfile::tempdir().unwrap();
        let store = test_store(tmp.path());

        let stored = store
            .upload(request("projects", "../../secret.pdf", b"s"))
            .await
            .unwrap();
        assert_eq!(stored.filename, "../../secret.pdf");
        assert!(stored.remote_id.starts_with("projects/"));
        assert!(stored.remote_id.ends_with("/secret.pdf"));
        assert!(tmp.path().join(&stored.remote_id).exists());
    }
}
