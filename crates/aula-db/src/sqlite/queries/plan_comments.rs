use chrono::Utc;
use rusqlite::{params, Connection, Row, ToSql};

use aula_core::plan_comment::{CreatePlanComment, PlanComment, PlanCommentFilter};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{query_all, NotFoundExt};
use crate::DbError;

fn row_to_plan_comment(row: &Row) -> rusqlite::Result<PlanComment> {
    Ok(PlanComment {
        id: row.get("id")?,
        plan_id: row.get("plan_id")?,
        author_id: row.get("author_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_plan_comment(conn: &Connection, id: i64) -> Result<PlanComment, DbError> {
    conn.query_row(
        "SELECT * FROM plan_comments WHERE id = ?1",
        params![id],
        row_to_plan_comment,
    )
    .or_not_found(|| format!("comment {id}"))
}

impl SqliteDatabase {
    pub fn create_plan_comment_sync(
        &self,
        author_id: i64,
        input: &CreatePlanComment,
    ) -> Result<PlanComment, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO plan_comments (plan_id, author_id, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![input.plan_id, author_id, input.content.trim(), now],
            )
            .to_db()?;
            select_plan_comment(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_plan_comment_sync(&self, id: i64) -> Result<PlanComment, DbError> {
        self.with_conn(|conn| select_plan_comment(conn, id))
    }

    pub fn list_plan_comments_sync(
        &self,
        filter: &PlanCommentFilter,
    ) -> Result<Vec<PlanComment>, DbError> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT c.* FROM plan_comments c WHERE 1=1");
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();
            if let Some(plan_id) = filter.plan_id {
                values.push(Box::new(plan_id));
                sql.push_str(&format!(" AND c.plan_id = ?{}", values.len()));
            }
            if let Some(author_id) = filter.author_id {
                values.push(Box::new(author_id));
                sql.push_str(&format!(" AND c.author_id = ?{}", values.len()));
            }
            if let Some(teacher_id) = filter.plan_teacher_id {
                values.push(Box::new(teacher_id));
                sql.push_str(&format!(
                    " AND c.plan_id IN (SELECT id FROM lesson_plans WHERE teacher_id = ?{})",
                    values.len()
                ));
            }
            sql.push_str(" ORDER BY c.created_at DESC, c.id DESC");
            query_all(conn, &sql, &values, row_to_plan_comment)
        })
    }

    pub fn update_plan_comment_sync(&self, id: i64, content: &str) -> Result<PlanComment, DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE plan_comments SET content = ?1, updated_at = ?2 WHERE id = ?3",
                    params![content.trim(), Utc::now(), id],
                )
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("comment {id}")));
            }
            select_plan_comment(conn, id)
        })
    }

    pub fn delete_plan_comment_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM plan_comments WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("comment {id}")));
            }
            Ok(())
        })
    }
}
