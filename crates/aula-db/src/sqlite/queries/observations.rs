use chrono::Utc;
use rusqlite::{params, Connection, Row, ToSql};

use aula_core::observation::{CreateObservation, Observation, UpdateObservation};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{execute_update, query_all, NotFoundExt};
use crate::DbError;

fn row_to_observation(row: &Row) -> rusqlite::Result<Observation> {
    Ok(Observation {
        id: row.get("id")?,
        student_id: row.get("student_id")?,
        teacher_id: row.get("teacher_id")?,
        period: row.get("period")?,
        strengths: row.get("strengths")?,
        difficulties: row.get("difficulties")?,
        commitments: row.get("commitments")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_observation(conn: &Connection, id: i64) -> Result<Observation, DbError> {
    conn.query_row(
        "SELECT * FROM observations WHERE id = ?1",
        params![id],
        row_to_observation,
    )
    .or_not_found(|| format!("observation {id}"))
}

impl SqliteDatabase {
    pub fn create_observation_sync(
        &self,
        teacher_id: i64,
        period: i64,
        input: &CreateObservation,
    ) -> Result<Observation, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO observations (student_id, teacher_id, period, strengths,
                                           difficulties, commitments, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    input.student_id,
                    teacher_id,
                    period,
                    input.strengths,
                    input.difficulties,
                    input.commitments,
                    now
                ],
            )
            .to_db()?;
            select_observation(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_observation_sync(&self, id: i64) -> Result<Observation, DbError> {
        self.with_conn(|conn| select_observation(conn, id))
    }

    pub fn list_observations_sync(
        &self,
        student_id: i64,
        period: Option<i64>,
    ) -> Result<Vec<Observation>, DbError> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM observations WHERE student_id = ?1");
            let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(student_id)];
            if let Some(period) = period {
                values.push(Box::new(period));
                sql.push_str(&format!(" AND period = ?{}", values.len()));
            }
            sql.push_str(" ORDER BY period ASC, created_at DESC, id DESC");
            query_all(conn, &sql, &values, row_to_observation)
        })
    }

    pub fn update_observation_sync(
        &self,
        id: i64,
        update: &UpdateObservation,
    ) -> Result<Observation, DbError> {
        self.with_conn(|conn| {
            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();
            for (set, value) in [
                ("strengths = ?", &update.strengths),
                ("difficulties = ?", &update.difficulties),
                ("commitments = ?", &update.commitments),
            ] {
                if let Some(value) = value {
                    sets.push(set);
                    values.push(Box::new(value.clone()));
                }
            }

            if sets.is_empty() {
                return select_observation(conn, id);
            }
            sets.push("updated_at = ?");
            values.push(Box::new(Utc::now()));
            if execute_update(conn, "observations", id, &sets, values)? == 0 {
                return Err(DbError::NotFound(format!("observation {id}")));
            }
            select_observation(conn, id)
        })
    }

    pub fn delete_observation_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM observations WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("observation {id}")));
            }
            Ok(())
        })
    }
}
