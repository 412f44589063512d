//! Keeps attachment metadata rows consistent with objects in remote storage.
//!
//! Uploads fail closed: nothing is written locally unless the upload
//! succeeded, and a fresh upload whose row could not be written is removed
//! again. Deletes fail open: remote failures are reported as
//! [`RemoteCleanup::Ignored`] and logged, never returned as errors.

use bytes::Bytes;
use tracing::{debug, warn};

use aula_core::attachment::{AttachmentKind, FileType, MAX_UPLOAD_BYTES};
use aula_core::Attachment;
use aula_db::DbError;
use aula_store::{Removal, StoreError, UploadRequest};

use crate::{AcademicService, ServiceError};

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Result of a best-effort remote delete.
#[derive(Debug)]
pub enum RemoteCleanup {
    Deleted,
    /// Storage reported the object was already gone.
    AlreadyGone,
    /// Storage is not configured, so no delete was attempted.
    Skipped,
    /// The delete failed; the remote object is now an orphan.
    Ignored(StoreError),
}

impl RemoteCleanup {
    pub fn is_ignored(&self) -> bool {
        matches!(self, RemoteCleanup::Ignored(_))
    }
}

impl AcademicService {
    /// Check an upload against the resource's rules without touching
    /// storage. Order: storage configured, MIME allowed, size, non-empty.
    pub fn check_upload(
        &self,
        kind: AttachmentKind,
        file: &FileUpload,
    ) -> Result<FileType, ServiceError> {
        if !self.store.is_configured() {
            return Err(ServiceError::Unavailable(format!(
                "file storage ({}) is not configured",
                self.store.backend_name()
            )));
        }
        let file_type = kind.classify(&file.content_type)?;
        if file.data.len() > MAX_UPLOAD_BYTES {
            return Err(ServiceError::Validation(format!(
                "file is {} bytes; the limit is {} bytes",
                file.data.len(),
                MAX_UPLOAD_BYTES
            )));
        }
        if file.data.is_empty() {
            return Err(ServiceError::Validation("file is empty".into()));
        }
        Ok(file_type)
    }

    pub(crate) async fn upload_attachment(
        &self,
        kind: AttachmentKind,
        file: FileUpload,
    ) -> Result<Attachment, ServiceError> {
        let file_type = self.check_upload(kind, &file)?;
        let stored = self
            .store
            .upload(UploadRequest {
                data: file.data,
                filename: file.filename,
                content_type: file.content_type,
                folder: kind.folder().to_string(),
            })
            .await?;
        debug!(remote_id = %stored.remote_id, folder = kind.folder(), "uploaded attachment");

        Ok(Attachment {
            remote_id: stored.remote_id,
            file_name: stored.filename,
            file_type,
            size_bytes: stored.size_bytes,
            view_link: stored.view_link,
            embed_link: stored.embed_link,
            download_link: stored.download_link,
        })
    }

    /// Delete a remote object, swallowing and logging any failure.
    pub(crate) async fn remove_remote(&self, remote_id: &str) -> RemoteCleanup {
        if !self.store.is_configured() {
            warn!(remote_id, "storage not configured; remote object left in place");
            return RemoteCleanup::Skipped;
        }
        match self.store.delete(remote_id).await {
            Ok(Removal::Deleted) => RemoteCleanup::Deleted,
            Ok(Removal::NotFound) => {
                debug!(remote_id, "remote object already gone");
                RemoteCleanup::AlreadyGone
            }
            Err(e) => {
                warn!(remote_id, error = %e, "remote delete failed; object orphaned");
                RemoteCleanup::Ignored(e)
            }
        }
    }

    /// Pass a local write through; if it failed, drop the object that was
    /// uploaded for it.
    pub(crate) async fn commit_or_discard<T>(
        &self,
        fresh: Option<&Attachment>,
        result: Result<T, DbError>,
    ) -> Result<T, ServiceError> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                if let Some(attachment) = fresh {
                    warn!(
                        remote_id = %attachment.remote_id,
                        error = %e,
                        "local write failed after upload; discarding new object"
                    );
                    self.remove_remote(&attachment.remote_id).await;
                }
                Err(e.into())
            }
        }
    }

    /// Bytes of a stored object, for objects the API serves itself.
    pub async fn fetch_file(&self, key: &str) -> Result<Bytes, ServiceError> {
        Ok(self.store.get(key).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use aula_db::SqliteDatabase;
    use aula_store::MemoryStore;

    fn service() -> (AcademicService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let db = Arc::new(SqliteDatabase::open_in_memory().unwrap());
        (AcademicService::new(db, store.clone()), store)
    }

    fn file(mime: &str, len: usize) -> FileUpload {
        FileUpload {
            filename: "upload.bin".into(),
            content_type: mime.into(),
            data: Bytes::from(vec![7u8; len]),
        }
    }

    #[test]
    fn size_boundaries() {
        let (svc, _) = service();
        let kind = AttachmentKind::LessonPlan;
        assert!(svc.check_upload(kind, &file("application/pdf", 1)).is_ok());
        assert!(svc
            .check_upload(kind, &file("application/pdf", MAX_UPLOAD_BYTES))
            .is_ok());
        assert!(matches!(
            svc.check_upload(kind, &file("application/pdf", MAX_UPLOAD_BYTES + 1)),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            svc.check_upload(kind, &file("application/pdf", 0)),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn unconfigured_storage_wins_over_other_checks() {
        let (svc, store) = service();
        store.set_configured(false);
        assert!(matches!(
            svc.check_upload(AttachmentKind::Project, &file("text/plain", 0)),
            Err(ServiceError::Unavailable(_))
        ));
    }

    #[test]
    fn mime_checked_before_size() {
        let (svc, _) = service();
        let err = svc
            .check_upload(AttachmentKind::Announcement, &file("video/mp4", 0))
            .unwrap_err();
        assert!(err.to_string().contains("video/mp4"));
    }

    #[tokio::test]
    async fn rejected_upload_makes_no_remote_call() {
        let (svc, store) = service();
        let res = svc
            .upload_attachment(AttachmentKind::LessonPlan, file("image/png", 10))
            .await;
        assert!(matches!(res, Err(ServiceError::Validation(_))));
        assert_eq!(store.upload_calls(), 0);
    }

    #[tokio::test]
    async fn remove_remote_outcomes() {
        let (svc, store) = service();
        let att = svc
            .upload_attachment(AttachmentKind::Project, file("image/png", 10))
            .await
            .unwrap();
        assert_eq!(att.file_type, FileType::Png);
        assert!(store.contains(&att.remote_id));

        assert!(matches!(
            svc.remove_remote(&att.remote_id).await,
            RemoteCleanup::Deleted
        ));
        assert!(matches!(
            svc.remove_remote(&att.remote_id).await,
            RemoteCleanup::AlreadyGone
        ));

        store.fail_deletes(true);
        assert!(svc.remove_remote("anything").await.is_ignored());

        store.set_configured(false);
        assert!(matches!(
            svc.remove_remote("anything").await,
            RemoteCleanup::Skipped
        ));
    }

    #[tokio::test]
    async fn failed_write_discards_fresh_upload() {
        let (svc, store) = service();
        let att = svc
            .upload_attachment(AttachmentKind::Evidence, file("application/pdf", 3))
            .await
            .unwrap();
        let res: Result<(), ServiceError> = svc
            .commit_or_discard(Some(&att), Err(DbError::Conflict("dup".into())))
            .await;
        assert!(matches!(res, Err(ServiceError::Conflict(_))));
        assert!(!store.contains(&att.remote_id));
    }
}
