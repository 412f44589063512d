use chrono::Utc;
use rusqlite::{params, Connection, Row, ToSql};

use aula_core::student::{CreateStudent, Student, UpdateStudent};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{execute_update, query_all, NotFoundExt};
use crate::DbError;

fn row_to_student(row: &Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get("id")?,
        group_id: row.get("group_id")?,
        document_number: row.get("document_number")?,
        first_names: row.get("first_names")?,
        last_names: row.get("last_names")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_student(conn: &Connection, id: i64) -> Result<Student, DbError> {
    conn.query_row(
        "SELECT * FROM students WHERE id = ?1",
        params![id],
        row_to_student,
    )
    .or_not_found(|| format!("student {id}"))
}

impl SqliteDatabase {
    pub fn create_student_sync(&self, input: &CreateStudent) -> Result<Student, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO students (group_id, document_number, first_names, last_names,
                                       created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    input.group_id,
                    input.document_number.trim(),
                    input.first_names.trim(),
                    input.last_names.trim(),
                    now
                ],
            )
            .to_db()?;
            select_student(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_student_sync(&self, id: i64) -> Result<Student, DbError> {
        self.with_conn(|conn| select_student(conn, id))
    }

    pub fn list_students_sync(&self, group_id: Option<i64>) -> Result<Vec<Student>, DbError> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM students WHERE 1=1");
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();
            if let Some(group_id) = group_id {
                values.push(Box::new(group_id));
                sql.push_str(&format!(" AND group_id = ?{}", values.len()));
            }
            sql.push_str(" ORDER BY last_names ASC, first_names ASC, id ASC");
            query_all(conn, &sql, &values, row_to_student)
        })
    }

    pub fn update_student_sync(&self, id: i64, update: &UpdateStudent) -> Result<Student, DbError> {
        self.with_conn(|conn| {
            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(group_id) = update.group_id {
                sets.push("group_id = ?");
                values.push(Box::new(group_id));
            }
            if let Some(ref document_number) = update.document_number {
                sets.push("document_number = ?");
                values.push(Box::new(document_number.trim().to_string()));
            }
            if let Some(ref first_names) = update.first_names {
                sets.push("first_names = ?");
                values.push(Box::new(first_names.trim().to_string()));
            }
            if let Some(ref last_names) = update.last_names {
                sets.push("last_names = ?");
                values.push(Box::new(last_names.trim().to_string()));
            }

            if sets.is_empty() {
                return select_student(conn, id);
            }
            sets.push("updated_at = ?");
            values.push(Box::new(Utc::now()));
            if execute_update(conn, "students", id, &sets, values)? == 0 {
                return Err(DbError::NotFound(format!("student {id}")));
            }
            select_student(conn, id)
        })
    }

    pub fn delete_student_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM students WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("student {id}")));
            }
            Ok(())
        })
    }
}
