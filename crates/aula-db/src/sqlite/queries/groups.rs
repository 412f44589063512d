use chrono::Utc;
use rusqlite::{params, Connection, Row, ToSql};

use aula_core::group::{CreateGroup, Group, UpdateGroup};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{execute_update, query_all, NotFoundExt};
use crate::DbError;

fn row_to_group(row: &Row) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get("id")?,
        grade_id: row.get("grade_id")?,
        name: row.get("name")?,
        code: row.get("code")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_group(conn: &Connection, id: i64) -> Result<Group, DbError> {
    conn.query_row(
        "SELECT * FROM class_groups WHERE id = ?1",
        params![id],
        row_to_group,
    )
    .or_not_found(|| format!("group {id}"))
}

impl SqliteDatabase {
    pub fn create_group_sync(&self, input: &CreateGroup) -> Result<Group, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO class_groups (grade_id, name, code, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![input.grade_id, input.name.trim(), input.code, now],
            )
            .to_db()?;
            select_group(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_group_sync(&self, id: i64) -> Result<Group, DbError> {
        self.with_conn(|conn| select_group(conn, id))
    }

    pub fn list_groups_sync(&self, grade_id: Option<i64>) -> Result<Vec<Group>, DbError> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM class_groups WHERE 1=1");
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();
            if let Some(grade_id) = grade_id {
                values.push(Box::new(grade_id));
                sql.push_str(&format!(" AND grade_id = ?{}", values.len()));
            }
            sql.push_str(" ORDER BY grade_id ASC, name ASC");
            query_all(conn, &sql, &values, row_to_group)
        })
    }

    pub fn update_group_sync(&self, id: i64, update: &UpdateGroup) -> Result<Group, DbError> {
        self.with_conn(|conn| {
            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(grade_id) = update.grade_id {
                sets.push("grade_id = ?");
                values.push(Box::new(grade_id));
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
                return select_group(conn, id);
            }
            sets.push("updated_at = ?");
            values.push(Box::new(Utc::now()));
            if execute_update(conn, "class_groups", id, &sets, values)? == 0 {
                return Err(DbError::NotFound(format!("group {id}")));
            }
            select_group(conn, id)
        })
    }

    pub fn delete_group_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM class_groups WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("group {id}")));
            }
            Ok(())
        })
    }

    pub fn assign_group_director_sync(&self, group_id: i64, teacher_id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO group_directors (teacher_id, group_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![teacher_id, group_id, Utc::now()],
            )
            .to_db()?;
            Ok(())
        })
    }

    pub fn unassign_group_director_sync(
        &self,
        group_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "DELETE FROM group_directors WHERE teacher_id = ?1 AND group_id = ?2",
                    params![teacher_id, group_id],
                )
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!(
                    "teacher {teacher_id} does not direct group {group_id}"
                )));
            }
            Ok(())
        })
    }

    pub fn is_group_director_sync(&self, group_id: i64, teacher_id: i64) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM group_directors WHERE teacher_id = ?1 AND group_id = ?2)",
                params![teacher_id, group_id],
                |row| row.get(0),
            )
            .to_db()
        })
    }
}
