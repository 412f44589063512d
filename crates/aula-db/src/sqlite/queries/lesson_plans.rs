use chrono::Utc;
use rusqlite::{params, Connection, Row, ToSql};

use aula_core::attachment::Attachment;
use aula_core::lesson_plan::{LessonPlan, LessonPlanFilter, NewLessonPlan, UpdateLessonPlan};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{execute_update, push_attachment, query_all, required_attachment, NotFoundExt};
use crate::DbError;

fn row_to_lesson_plan(row: &Row) -> rusqlite::Result<LessonPlan> {
    Ok(LessonPlan {
        id: row.get("id")?,
        teacher_id: row.get("teacher_id")?,
        subject_id: row.get("subject_id")?,
        site_id: row.get("site_id")?,
        period_id: row.get("period_id")?,
        title: row.get("title")?,
        attachment: required_attachment(row)?,
        uploaded_at: row.get("uploaded_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_lesson_plan(conn: &Connection, id: i64) -> Result<LessonPlan, DbError> {
    conn.query_row(
        "SELECT * FROM lesson_plans WHERE id = ?1",
        params![id],
        row_to_lesson_plan,
    )
    .or_not_found(|| format!("lesson plan {id}"))
}

impl SqliteDatabase {
    pub fn create_lesson_plan_sync(&self, input: &NewLessonPlan) -> Result<LessonPlan, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let a = &input.attachment;
            conn.execute(
                "INSERT INTO lesson_plans (teacher_id, subject_id, site_id, period_id, title,
                                           remote_id, file_name, file_type, size_bytes,
                                           view_link, embed_link, download_link,
                                           uploaded_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13, ?13)",
                params![
                    input.teacher_id,
                    input.subject_id,
                    input.site_id,
                    input.period_id,
                    input.title.trim(),
                    a.remote_id,
                    a.file_name,
                    a.file_type.as_str(),
                    a.size_bytes,
                    a.view_link,
                    a.embed_link,
                    a.download_link,
                    now
                ],
            )
            .to_db()?;
            select_lesson_plan(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_lesson_plan_sync(&self, id: i64) -> Result<LessonPlan, DbError> {
        self.with_conn(|conn| select_lesson_plan(conn, id))
    }

    pub fn list_lesson_plans_sync(
        &self,
        filter: &LessonPlanFilter,
    ) -> Result<Vec<LessonPlan>, DbError> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM lesson_plans WHERE 1=1");
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();
            for (column, value) in [
                ("teacher_id", filter.teacher_id),
                ("subject_id", filter.subject_id),
                ("site_id", filter.site_id),
                ("period_id", filter.period_id),
            ] {
                if let Some(value) = value {
                    values.push(Box::new(value));
                    sql.push_str(&format!(" AND {column} = ?{}", values.len()));
                }
            }
            sql.push_str(" ORDER BY created_at DESC, id DESC");
            query_all(conn, &sql, &values, row_to_lesson_plan)
        })
    }

    pub fn update_lesson_plan_sync(
        &self,
        id: i64,
        update: &UpdateLessonPlan,
        attachment: Option<&Attachment>,
    ) -> Result<LessonPlan, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(ref title) = update.title {
                sets.push("title = ?");
                values.push(Box::new(title.trim().to_string()));
            }
            if let Some(subject_id) = update.subject_id {
                sets.push("subject_id = ?");
                values.push(Box::new(subject_id));
            }
            if let Some(period_id) = update.period_id {
                sets.push("period_id = ?");
                values.push(Box::new(period_id));
            }
            if let Some(a) = attachment {
                push_attachment(Some(a), &mut sets, &mut values);
                sets.push("uploaded_at = ?");
                values.push(Box::new(now));
            }

            if sets.is_empty() {
                return select_lesson_plan(conn, id);
            }
            sets.push("updated_at = ?");
            values.push(Box::new(now));
            if execute_update(conn, "lesson_plans", id, &sets, values)? == 0 {
                return Err(DbError::NotFound(format!("lesson plan {id}")));
            }
            select_lesson_plan(conn, id)
        })
    }

    pub fn delete_lesson_plan_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM lesson_plans WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("lesson plan {id}")));
            }
            Ok(())
        })
    }
}
