use chrono::Utc;
use rusqlite::{params, Connection, Row, ToSql};

use aula_core::site::{CreateSite, Site, UpdateSite};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{execute_update, query_all, NotFoundExt};
use crate::DbError;

fn row_to_site(row: &Row) -> rusqlite::Result<Site> {
    Ok(Site {
        id: row.get("id")?,
        name: row.get("name")?,
        code: row.get("code")?,
        address: row.get("address")?,
        active: row.get("active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_site(conn: &Connection, id: i64) -> Result<Site, DbError> {
    conn.query_row("SELECT * FROM sites WHERE id = ?1", params![id], row_to_site)
        .or_not_found(|| format!("site {id}"))
}

impl SqliteDatabase {
    pub fn create_site_sync(&self, input: &CreateSite) -> Result<Site, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO sites (name, code, address, active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![input.name.trim(), input.code.trim(), input.address, input.active, now],
            )
            .to_db()?;
            select_site(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_site_sync(&self, id: i64) -> Result<Site, DbError> {
        self.with_conn(|conn| select_site(conn, id))
    }

    pub fn list_sites_sync(&self) -> Result<Vec<Site>, DbError> {
        self.with_conn(|conn| {
            query_all(conn, "SELECT * FROM sites ORDER BY name ASC", &[], row_to_site)
        })
    }

    pub fn update_site_sync(&self, id: i64, update: &UpdateSite) -> Result<Site, DbError> {
        self.with_conn(|conn| {
            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(ref name) = update.name {
                sets.push("name = ?");
                values.push(Box::new(name.trim().to_string()));
            }
            if let Some(ref code) = update.code {
                sets.push("code = ?");
                values.push(Box::new(code.trim().to_string()));
            }
            if let Some(ref address) = update.address {
                sets.push("address = ?");
                values.push(Box::new(address.clone()));
            }
            if let Some(active) = update.active {
                sets.push("active = ?");
                values.push(Box::new(active));
            }

            if sets.is_empty() {
                return select_site(conn, id);
            }
            sets.push("updated_at = ?");
            values.push(Box::new(Utc::now()));
            if execute_update(conn, "sites", id, &sets, values)? == 0 {
                return Err(DbError::NotFound(format!("site {id}")));
            }
            select_site(conn, id)
        })
    }

    pub fn delete_site_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM sites WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("site {id}")));
            }
            Ok(())
        })
    }
}
