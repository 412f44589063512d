use chrono::Utc;
use rusqlite::{params, Connection, Row, ToSql};

use aula_core::announcement::{Announcement, CreateAnnouncement, UpdateAnnouncement};
use aula_core::attachment::{Attachment, AttachmentChange};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{
    execute_update, optional_attachment, push_attachment_change, query_all, NotFoundExt,
};
use crate::DbError;

fn row_to_announcement(row: &Row) -> rusqlite::Result<Announcement> {
    Ok(Announcement {
        id: row.get("id")?,
        author_id: row.get("author_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        attachment: optional_attachment(row)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_announcement(conn: &Connection, id: i64) -> Result<Announcement, DbError> {
    conn.query_row(
        "SELECT * FROM announcements WHERE id = ?1",
        params![id],
        row_to_announcement,
    )
    .or_not_found(|| format!("announcement {id}"))
}

impl SqliteDatabase {
    pub fn create_announcement_sync(
        &self,
        author_id: i64,
        input: &CreateAnnouncement,
        attachment: Option<&Attachment>,
    ) -> Result<Announcement, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO announcements (author_id, title, content, remote_id, file_name,
                                            file_type, size_bytes, view_link, embed_link,
                                            download_link, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    author_id,
                    input.title.trim(),
                    input.content.trim(),
                    attachment.map(|a| a.remote_id.clone()),
                    attachment.map(|a| a.file_name.clone()),
                    attachment.map(|a| a.file_type.as_str()),
                    attachment.map(|a| a.size_bytes),
                    attachment.map(|a| a.view_link.clone()),
                    attachment.map(|a| a.embed_link.clone()),
                    attachment.map(|a| a.download_link.clone()),
                    now
                ],
            )
            .to_db()?;
            select_announcement(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_announcement_sync(&self, id: i64) -> Result<Announcement, DbError> {
        self.with_conn(|conn| select_announcement(conn, id))
    }

    pub fn list_announcements_sync(&self) -> Result<Vec<Announcement>, DbError> {
        self.with_conn(|conn| {
            query_all(
                conn,
                "SELECT * FROM announcements ORDER BY created_at DESC, id DESC",
                &[],
                row_to_announcement,
            )
        })
    }

    pub fn update_announcement_sync(
        &self,
        id: i64,
        update: &UpdateAnnouncement,
        attachment: &AttachmentChange,
    ) -> Result<Announcement, DbError> {
        self.with_conn(|conn| {
            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(ref title) = update.title {
                sets.push("title = ?");
                values.push(Box::new(title.trim().to_string()));
            }
            if let Some(ref content) = update.content {
                sets.push("content = ?");
                values.push(Box::new(content.trim().to_string()));
            }
            push_attachment_change(attachment, &mut sets, &mut values);

            if sets.is_empty() {
                return select_announcement(conn, id);
            }
            sets.push("updated_at = ?");
            values.push(Box::new(Utc::now()));
            if execute_update(conn, "announcements", id, &sets, values)? == 0 {
                return Err(DbError::NotFound(format!("announcement {id}")));
            }
            select_announcement(conn, id)
        })
    }

    pub fn delete_announcement_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM announcements WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("announcement {id}")));
            }
            Ok(())
        })
    }
}
