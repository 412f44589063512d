use chrono::Utc;
use rusqlite::{params, Connection, Row, ToSql};

use aula_core::project_comment::{CommentTarget, ProjectComment};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{query_all, NotFoundExt};
use crate::DbError;

fn row_to_project_comment(row: &Row) -> rusqlite::Result<ProjectComment> {
    let project_id: Option<i64> = row.get("project_id")?;
    let evidence_id: Option<i64> = row.get("evidence_id")?;
    let target = CommentTarget::from_columns(project_id, evidence_id).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(
            0,
            "project_id/evidence_id".into(),
            rusqlite::types::Type::Null,
        )
    })?;
    Ok(ProjectComment {
        id: row.get("id")?,
        target,
        author_id: row.get("author_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_project_comment(conn: &Connection, id: i64) -> Result<ProjectComment, DbError> {
    conn.query_row(
        "SELECT * FROM project_comments WHERE id = ?1",
        params![id],
        row_to_project_comment,
    )
    .or_not_found(|| format!("project comment {id}"))
}

impl SqliteDatabase {
    pub fn create_project_comment_sync(
        &self,
        author_id: i64,
        target: CommentTarget,
        content: &str,
    ) -> Result<ProjectComment, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO project_comments (project_id, evidence_id, author_id, content,
                                               created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    target.project_id(),
                    target.evidence_id(),
                    author_id,
                    content.trim(),
                    now
                ],
            )
            .to_db()?;
            select_project_comment(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_project_comment_sync(&self, id: i64) -> Result<ProjectComment, DbError> {
        self.with_conn(|conn| select_project_comment(conn, id))
    }

    pub fn list_project_comments_sync(
        &self,
        target: CommentTarget,
    ) -> Result<Vec<ProjectComment>, DbError> {
        self.with_conn(|conn| {
            let (sql, id) = match target {
                CommentTarget::Project(id) => (
                    "SELECT * FROM project_comments WHERE project_id = ?1
                     ORDER BY created_at ASC, id ASC",
                    id,
                ),
                CommentTarget::Evidence(id) => (
                    "SELECT * FROM project_comments WHERE evidence_id = ?1
                     ORDER BY created_at ASC, id ASC",
                    id,
                ),
            };
            let values: Vec<Box<dyn ToSql>> = vec![Box::new(id)];
            query_all(conn, sql, &values, row_to_project_comment)
        })
    }

    pub fn update_project_comment_sync(
        &self,
        id: i64,
        content: &str,
    ) -> Result<ProjectComment, DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE project_comments SET content = ?1, updated_at = ?2 WHERE id = ?3",
                    params![content.trim(), Utc::now(), id],
                )
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("project comment {id}")));
            }
            select_project_comment(conn, id)
        })
    }

    pub fn delete_project_comment_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM project_comments WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("project comment {id}")));
            }
            Ok(())
        })
    }
}
