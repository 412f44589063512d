use chrono::Utc;
use rusqlite::{params, Connection, Row, ToSql};

use aula_core::area::{Area, CreateArea, UpdateArea};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{execute_update, query_all, NotFoundExt};
use crate::DbError;

fn row_to_area(row: &Row) -> rusqlite::Result<Area> {
    Ok(Area {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        active: row.get("active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_area(conn: &Connection, id: i64) -> Result<Area, DbError> {
    conn.query_row("SELECT * FROM areas WHERE id = ?1", params![id], row_to_area)
        .or_not_found(|| format!("area {id}"))
}

impl SqliteDatabase {
    pub fn create_area_sync(&self, input: &CreateArea) -> Result<Area, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO areas (name, description, active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![input.name.trim(), input.description, input.active, now],
            )
            .to_db()?;
            select_area(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_area_sync(&self, id: i64) -> Result<Area, DbError> {
        self.with_conn(|conn| select_area(conn, id))
    }

    pub fn list_areas_sync(&self) -> Result<Vec<Area>, DbError> {
        self.with_conn(|conn| {
            query_all(conn, "SELECT * FROM areas ORDER BY name ASC", &[], row_to_area)
        })
    }

    pub fn update_area_sync(&self, id: i64, update: &UpdateArea) -> Result<Area, DbError> {
        self.with_conn(|conn| {
            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(ref name) = update.name {
                sets.push("name = ?");
                values.push(Box::new(name.trim().to_string()));
            }
            if let Some(ref description) = update.description {
                sets.push("description = ?");
                values.push(Box::new(description.clone()));
            }
            if let Some(active) = update.active {
                sets.push("active = ?");
                values.push(Box::new(active));
            }

            if sets.is_empty() {
                return select_area(conn, id);
            }
            sets.push("updated_at = ?");
            values.push(Box::new(Utc::now()));
            if execute_update(conn, "areas", id, &sets, values)? == 0 {
                return Err(DbError::NotFound(format!("area {id}")));
            }
            select_area(conn, id)
        })
    }

    pub fn delete_area_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM areas WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("area {id}")));
            }
            Ok(())
        })
    }
}
