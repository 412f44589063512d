use tracing::info;

use aula_core::announcement::{Announcement, CreateAnnouncement, UpdateAnnouncement};
use aula_core::{AttachmentChange, AttachmentKind, User};

use crate::access::{require_admin, require_owner};
use crate::{AcademicService, FileUpload, RemoteCleanup, ServiceError};

impl AcademicService {
    pub async fn list_announcements(&self) -> Result<Vec<Announcement>, ServiceError> {
        Ok(self.db.list_announcements().await?)
    }

    pub async fn get_announcement(&self, id: i64) -> Result<Announcement, ServiceError> {
        Ok(self.db.get_announcement(id).await?)
    }

    pub async fn create_announcement(
        &self,
        actor: &User,
        input: &CreateAnnouncement,
        file: Option<FileUpload>,
    ) -> Result<Announcement, ServiceError> {
        require_admin(actor)?;
        input.validate()?;
        let attachment = match file {
            Some(file) => Some(
                self.upload_attachment(AttachmentKind::Announcement, file)
                    .await?,
            ),
            None => None,
        };
        let result = self
            .db
            .create_announcement(actor.id, input, attachment.as_ref())
            .await;
        let announcement = self.commit_or_discard(attachment.as_ref(), result).await?;
        info!(announcement_id = announcement.id, author_id = actor.id, "announcement published");
        Ok(announcement)
    }

    pub async fn update_announcement(
        &self,
        actor: &User,
        id: i64,
        update: &UpdateAnnouncement,
        file: Option<FileUpload>,
        remove_file: bool,
    ) -> Result<Announcement, ServiceError> {
        let current = self.db.get_announcement(id).await?;
        require_owner(actor, current.author_id, "announcement")?;
        if remove_file && file.is_some() {
            return Err(ServiceError::Validation(
                "send either a new file or remove_file, not both".into(),
            ));
        }
        update.validate()?;

        let change = match file {
            Some(file) => AttachmentChange::Replace(
                self.upload_attachment(AttachmentKind::Announcement, file)
                    .await?,
            ),
            None if remove_file => AttachmentChange::Remove,
            None => AttachmentChange::Keep,
        };
        let fresh = match &change {
            AttachmentChange::Replace(a) => Some(a),
            _ => None,
        };
        let result = self.db.update_announcement(id, update, &change).await;
        let announcement = self.commit_or_discard(fresh, result).await?;

        if change != AttachmentChange::Keep {
            if let Some(old) = &current.attachment {
                self.remove_remote(&old.remote_id).await;
            }
        }
        Ok(announcement)
    }

    pub async fn delete_announcement(
        &self,
        actor: &User,
        id: i64,
    ) -> Result<Option<RemoteCleanup>, ServiceError> {
        let announcement = self.db.get_announcement(id).await?;
        require_owner(actor, announcement.author_id, "announcement")?;
        let cleanup = match &announcement.attachment {
            Some(a) => Some(self.remove_remote(&a.remote_id).await),
            None => None,
        };
        self.db.delete_announcement(id).await?;
        Ok(cleanup)
    }
}
