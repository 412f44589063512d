use chrono::Utc;
use rusqlite::{params, Connection, Row, ToSql};

use aula_core::subject::{CreateSubject, Subject, SubjectFilter, UpdateSubject};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{execute_update, query_all, NotFoundExt};
use crate::DbError;

fn row_to_subject(row: &Row) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: row.get("id")?,
        name: row.get("name")?,
        area_id: row.get("area_id")?,
        code: row.get("code")?,
        description: row.get("description")?,
        grades: row.get("grades")?,
        active: row.get("active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_subject(conn: &Connection, id: i64) -> Result<Subject, DbError> {
    conn.query_row(
        "SELECT * FROM subjects WHERE id = ?1",
        params![id],
        row_to_subject,
    )
    .or_not_found(|| format!("subject {id}"))
}

impl SqliteDatabase {
    pub fn create_subject_sync(&self, input: &CreateSubject) -> Result<Subject, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO subjects (name, area_id, code, description, grades, active,
                                       created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    input.name.trim(),
                    input.area_id,
                    input.code,
                    input.description,
                    input.grades,
                    input.active,
                    now
                ],
            )
            .to_db()?;
            select_subject(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_subject_sync(&self, id: i64) -> Result<Subject, DbError> {
        self.with_conn(|conn| select_subject(conn, id))
    }

    pub fn list_subjects_sync(&self, filter: &SubjectFilter) -> Result<Vec<Subject>, DbError> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM subjects WHERE 1=1");
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();
            if let Some(area_id) = filter.area_id {
                values.push(Box::new(area_id));
                sql.push_str(&format!(" AND area_id = ?{}", values.len()));
            }
            if let Some(active) = filter.active {
                values.push(Box::new(active));
                sql.push_str(&format!(" AND active = ?{}", values.len()));
            }
            if let Some(teacher_id) = filter.teacher_id {
                values.push(Box::new(teacher_id));
                sql.push_str(&format!(
                    " AND id IN (SELECT subject_id FROM teacher_subjects WHERE teacher_id = ?{})",
                    values.len()
                ));
            }
            sql.push_str(" ORDER BY name ASC, id ASC");
            query_all(conn, &sql, &values, row_to_subject)
        })
    }

    pub fn update_subject_sync(&self, id: i64, update: &UpdateSubject) -> Result<Subject, DbError> {
        self.with_conn(|conn| {
            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(ref name) = update.name {
                sets.push("name = ?");
                values.push(Box::new(name.trim().to_string()));
            }
            if let Some(area_id) = update.area_id {
                sets.push("area_id = ?");
                values.push(Box::new(area_id));
            }
            if let Some(ref code) = update.code {
                sets.push("code = ?");
                values.push(Box::new(code.clone()));
            }
            if let Some(ref description) = update.description {
                sets.push("description = ?");
                values.push(Box::new(description.clone()));
            }
            if let Some(ref grades) = update.grades {
                sets.push("grades = ?");
                values.push(Box::new(grades.clone()));
            }
            if let Some(active) = update.active {
                sets.push("active = ?");
                values.push(Box::new(active));
            }

            if sets.is_empty() {
                return select_subject(conn, id);
            }
            sets.push("updated_at = ?");
            values.push(Box::new(Utc::now()));
            if execute_update(conn, "subjects", id, &sets, values)? == 0 {
                return Err(DbError::NotFound(format!("subject {id}")));
            }
            select_subject(conn, id)
        })
    }

    pub fn delete_subject_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM subjects WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("subject {id}")));
            }
            Ok(())
        })
    }

    /// Idempotent: assigning twice leaves one row.
    pub fn assign_subject_teacher_sync(
        &self,
        subject_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO teacher_subjects (teacher_id, subject_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![teacher_id, subject_id, Utc::now()],
            )
            .to_db()?;
            Ok(())
        })
    }

    pub fn unassign_subject_teacher_sync(
        &self,
        subject_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "DELETE FROM teacher_subjects WHERE teacher_id = ?1 AND subject_id = ?2",
                    params![teacher_id, subject_id],
                )
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!(
                    "teacher {teacher_id} is not assigned to subject {subject_id}"
                )));
            }
            Ok(())
        })
    }
}
