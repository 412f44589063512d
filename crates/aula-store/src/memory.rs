use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    object_key, sanitize_filename, served_links, ObjectStore, Removal, StoreError, StoredObject,
    UploadRequest,
};

/// In-process store for tests and demos. Failures can be switched on to
/// exercise the error paths of callers, and every call is counted.
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Bytes>>,
    public_base_url: String,
    configured: AtomicBool,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
    uploads: AtomicUsize,
    deletes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_public_url("http://localhost:8000")
    }

    pub fn with_public_url(public_base_url: &str) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            public_base_url: public_base_url.to_string(),
            configured: AtomicBool::new(true),
            fail_uploads: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            uploads: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::SeqCst);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Upload attempts, including failed ones.
    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Delete attempts, including failed ones.
    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, remote_id: &str) -> bool {
        self.lock().contains_key(remote_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Bytes>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, StoreError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if !self.is_configured() {
            return Err(StoreError::NotConfigured("memory store disabled".into()));
        }
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StoreError::Internal("simulated upload failure".into()));
        }
        let key = object_key(&request.folder, &sanitize_filename(&request.filename));
        let size_bytes = request.data.len() as i64;
        self.lock().insert(key.clone(), request.data);

        let (view_link, embed_link, download_link) = served_links(&self.public_base_url, &key);
        Ok(StoredObject {
            remote_id: key,
            filename: request.filename,
            view_link,
            embed_link,
            download_link,
            size_bytes,
        })
    }

    async fn delete(&self, remote_id: &str) -> Result<Removal, StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Internal("simulated delete failure".into()));
        }
        match self.lock().remove(remote_id) {
            Some(_) => Ok(Removal::Deleted),
            None => Ok(Removal::NotFound),
        }
    }

    async fn get(&self, remote_id: &str) -> Result<Bytes, StoreError> {
        self.lock()
            .get(remote_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(remote_id.to_string()))
    }
}
