use chrono::Utc;
use rusqlite::{params, Connection, Row, ToSql};

use aula_core::grade::{CreateGrade, Grade, UpdateGrade};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{execute_update, query_all, NotFoundExt};
use crate::DbError;

const GRADE_SELECT: &str = "SELECT g.*,
        (SELECT COUNT(*) FROM class_groups cg WHERE cg.grade_id = g.id) AS group_count
     FROM grades g";

fn row_to_grade(row: &Row) -> rusqlite::Result<Grade> {
    Ok(Grade {
        id: row.get("id")?,
        site_id: row.get("site_id")?,
        name: row.get("name")?,
        code: row.get("code")?,
        group_count: row.get("group_count")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_grade(conn: &Connection, id: i64) -> Result<Grade, DbError> {
    conn.query_row(
        &format!("{GRADE_SELECT} WHERE g.id = ?1"),
        params![id],
        row_to_grade,
    )
    .or_not_found(|| format!("grade {id}"))
}

impl SqliteDatabase {
    pub fn create_grade_sync(&self, input: &CreateGrade) -> Result<Grade, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO grades (site_id, name, code, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![input.site_id, input.name.trim(), input.code, now],
            )
            .to_db()?;
            select_grade(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_grade_sync(&self, id: i64) -> Result<Grade, DbError> {
        self.with_conn(|conn| select_grade(conn, id))
    }

    pub fn list_grades_sync(&self, site_id: Option<i64>) -> Result<Vec<Grade>, DbError> {
        self.with_conn(|conn| {
            let mut sql = format!("{GRADE_SELECT} WHERE 1=1");
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();
            if let Some(site_id) = site_id {
                values.push(Box::new(site_id));
                sql.push_str(&format!(" AND g.site_id = ?{}", values.len()));
            }
            sql.push_str(" ORDER BY g.site_id ASC, g.name ASC");
            query_all(conn, &sql, &values, row_to_grade)
        })
    }

    pub fn update_grade_sync(&self, id: i64, update: &UpdateGrade) -> Result<Grade, DbError> {
        self.with_conn(|conn| {
            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(site_id) = update.site_id {
                sets.push("site_id = ?");
                values.push(Box::new(site_id));
            }
            if let Some(ref name) = update.name {
                sets.push("name = ?");
                values.push(Box::new(name.trim().to_string()));
            }
            if let Some(ref code) = update.code {
                sets.push("code = ?");
                values.push(Box::new(code.clone()));
            }

            if sets.is_empty() {
                return select_grade(conn, id);
            }
            sets.push("updated_at = ?");
            values.push(Box::new(Utc::now()));
            if execute_update(conn, "grades", id, &sets, values)? == 0 {
                return Err(DbError::NotFound(format!("grade {id}")));
            }
            select_grade(conn, id)
        })
    }

    pub fn delete_grade_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM grades WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("grade {id}")));
            }
            Ok(())
        })
    }
}
