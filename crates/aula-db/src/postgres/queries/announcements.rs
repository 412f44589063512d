use chrono::{DateTime, Utc};

use aula_core::announcement::{Announcement, CreateAnnouncement, UpdateAnnouncement};
use aula_core::attachment::{Attachment, AttachmentChange};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{delete_by_id, AttachmentColumns, BindValue, UpdateSet};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct AnnouncementRow {
    id: i64,
    author_id: i64,
    title: String,
    content: String,
    #[sqlx(flatten)]
    attachment: AttachmentColumns,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AnnouncementRow> for Announcement {
    fn from(r: AnnouncementRow) -> Self {
        Announcement {
            id: r.id,
            author_id: r.author_id,
            title: r.title,
            content: r.content,
            attachment: r.attachment.into_optional(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_announcement(
        &self,
        author_id: i64,
        input: &CreateAnnouncement,
        attachment: Option<&Attachment>,
    ) -> Result<Announcement, DbError> {
        let row = sqlx::query_as::<_, AnnouncementRow>(
            "INSERT INTO announcements (author_id, title, content, remote_id, file_name,
                                        file_type, size_bytes, view_link, embed_link,
                                        download_link, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
             RETURNING *",
        )
        .bind(author_id)
        .bind(input.title.trim())
        .bind(input.content.trim())
        .bind(attachment.map(|a| a.remote_id.clone()))
        .bind(attachment.map(|a| a.file_name.clone()))
        .bind(attachment.map(|a| a.file_type.as_str()))
        .bind(attachment.map(|a| a.size_bytes))
        .bind(attachment.map(|a| a.view_link.clone()))
        .bind(attachment.map(|a| a.embed_link.clone()))
        .bind(attachment.map(|a| a.download_link.clone()))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_announcement(&self, id: i64) -> Result<Announcement, DbError> {
        let row = sqlx::query_as::<_, AnnouncementRow>("SELECT * FROM announcements WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("announcement {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_announcements(&self) -> Result<Vec<Announcement>, DbError> {
        let rows = sqlx::query_as::<_, AnnouncementRow>(
            "SELECT * FROM announcements ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_announcement(
        &self,
        id: i64,
        update: &UpdateAnnouncement,
        attachment: &AttachmentChange,
    ) -> Result<Announcement, DbError> {
        let mut set = UpdateSet::default();
        if let Some(ref title) = update.title {
            set.set("title", BindValue::Str(title.trim().to_string()));
        }
        if let Some(ref content) = update.content {
            set.set("content", BindValue::Str(content.trim().to_string()));
        }
        set.attachment_change(attachment);
        if set.is_empty() {
            return self.pg_get_announcement(id).await;
        }
        set.set("updated_at", BindValue::DateTime(Utc::now()));
        if set.execute(&self.pool, "announcements", id).await? == 0 {
            return Err(pg_not_found(&format!("announcement {id}")));
        }
        self.pg_get_announcement(id).await
    }

    pub(crate) async fn pg_delete_announcement(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "announcements", "announcement", id).await
    }
}
