use chrono::Utc;
use rusqlite::{params, Connection, Row};

use aula_core::attachment::Attachment;
use aula_core::evidence::{CreateEvidence, Evidence};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{required_attachment, NotFoundExt};
use crate::DbError;

fn row_to_evidence(row: &Row) -> rusqlite::Result<Evidence> {
    Ok(Evidence {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        evidence_date: row.get("evidence_date")?,
        attachment: required_attachment(row)?,
        uploaded_by: row.get("uploaded_by")?,
        created_at: row.get("created_at")?,
    })
}

fn select_evidence(conn: &Connection, id: i64) -> Result<Evidence, DbError> {
    conn.query_row(
        "SELECT * FROM evidence WHERE id = ?1",
        params![id],
        row_to_evidence,
    )
    .or_not_found(|| format!("evidence {id}"))
}

impl SqliteDatabase {
    /// `evidence_date` defaults to today when the input leaves it out.
    pub fn create_evidence_sync(
        &self,
        project_id: i64,
        uploaded_by: i64,
        input: &CreateEvidence,
        attachment: &Attachment,
    ) -> Result<Evidence, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let evidence_date = input.evidence_date.unwrap_or_else(|| now.date_naive());
            conn.execute(
                "INSERT INTO evidence (project_id, title, description, evidence_date,
                                       remote_id, file_name, file_type, size_bytes,
                                       view_link, embed_link, download_link,
                                       uploaded_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    project_id,
                    input.title.trim(),
                    input.description,
                    evidence_date,
                    attachment.remote_id,
                    attachment.file_name,
                    attachment.file_type.as_str(),
                    attachment.size_bytes,
                    attachment.view_link,
                    attachment.embed_link,
                    attachment.download_link,
                    uploaded_by,
                    now
                ],
            )
            .to_db()?;
            select_evidence(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_evidence_sync(&self, id: i64) -> Result<Evidence, DbError> {
        self.with_conn(|conn| select_evidence(conn, id))
    }

    pub fn list_evidence_sync(&self, project_id: i64) -> Result<Vec<Evidence>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT * FROM evidence WHERE project_id = ?1
                     ORDER BY evidence_date DESC, id DESC",
                )
                .to_db()?;
            let rows = stmt
                .query_map(params![project_id], row_to_evidence)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(rows)
        })
    }

    pub fn delete_evidence_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM evidence WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("evidence {id}")));
            }
            Ok(())
        })
    }
}
