use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use aula_core::period::{Period, PeriodActivationPolicy, UpdatePeriod};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{execute_update, query_all, NotFoundExt};
use crate::DbError;

fn row_to_period(row: &Row) -> rusqlite::Result<Period> {
    Ok(Period {
        id: row.get("id")?,
        name: row.get("name")?,
        starts_on: row.get("starts_on")?,
        ends_on: row.get("ends_on")?,
        active: row.get("active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_period(conn: &Connection, id: i64) -> Result<Period, DbError> {
    conn.query_row(
        "SELECT * FROM periods WHERE id = ?1",
        params![id],
        row_to_period,
    )
    .or_not_found(|| format!("period {id}"))
}

impl SqliteDatabase {
    pub fn list_periods_sync(&self) -> Result<Vec<Period>, DbError> {
        self.with_conn(|conn| {
            query_all(conn, "SELECT * FROM periods ORDER BY name ASC", &[], row_to_period)
        })
    }

    pub fn get_period_sync(&self, id: i64) -> Result<Period, DbError> {
        self.with_conn(|conn| select_period(conn, id))
    }

    pub fn get_active_period_sync(&self) -> Result<Option<Period>, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM periods WHERE active = 1 LIMIT 1",
                [],
                row_to_period,
            )
            .optional()
            .to_db()
        })
    }

    pub fn update_period_sync(
        &self,
        id: i64,
        update: &UpdatePeriod,
        policy: PeriodActivationPolicy,
    ) -> Result<Period, DbError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction().to_db()?;
            let current = select_period(&tx, id)?;
            let now = Utc::now();

            if update.active == Some(true) && !current.active {
                let other: Option<String> = tx
                    .query_row(
                        "SELECT name FROM periods WHERE active = 1 AND id <> ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()
                    .to_db()?;
                if let Some(other) = other {
                    match policy {
                        PeriodActivationPolicy::ExclusiveLock => {
                            return Err(DbError::Conflict(format!(
                                "period {other} is already active"
                            )));
                        }
                        PeriodActivationPolicy::AutoDeactivate => {
                            tx.execute(
                                "UPDATE periods SET active = 0, updated_at = ?1
                                 WHERE active = 1 AND id <> ?2",
                                params![now, id],
                            )
                            .to_db()?;
                        }
                    }
                }
            }

            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();
            if let Some(starts_on) = update.starts_on {
                sets.push("starts_on = ?");
                values.push(Box::new(starts_on));
            }
            if let Some(ends_on) = update.ends_on {
                sets.push("ends_on = ?");
                values.push(Box::new(ends_on));
            }
            if let Some(active) = update.active {
                sets.push("active = ?");
                values.push(Box::new(active));
            }
            if !sets.is_empty() {
                sets.push("updated_at = ?");
                values.push(Box::new(now));
                execute_update(&tx, "periods", id, &sets, values)?;
            }

            let period = select_period(&tx, id)?;
            tx.commit().to_db()?;
            Ok(period)
        })
    }
}
