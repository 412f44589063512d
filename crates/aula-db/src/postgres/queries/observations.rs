use chrono::{DateTime, Utc};

use aula_core::observation::{CreateObservation, Observation, UpdateObservation};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{bind_all_as, delete_by_id, BindValue, Filter, UpdateSet};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct ObservationRow {
    id: i64,
    student_id: i64,
    teacher_id: i64,
    period: i64,
    strengths: Option<String>,
    difficulties: Option<String>,
    commitments: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ObservationRow> for Observation {
    fn from(r: ObservationRow) -> Self {
        Observation {
            id: r.id,
            student_id: r.student_id,
            teacher_id: r.teacher_id,
            period: r.period,
            strengths: r.strengths,
            difficulties: r.difficulties,
            commitments: r.commitments,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_observation(
        &self,
        teacher_id: i64,
        period: i64,
        input: &CreateObservation,
    ) -> Result<Observation, DbError> {
        let row = sqlx::query_as::<_, ObservationRow>(
            "INSERT INTO observations (student_id, teacher_id, period, strengths,
                                       difficulties, commitments, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING *",
        )
        .bind(input.student_id)
        .bind(teacher_id)
        .bind(period)
        .bind(&input.strengths)
        .bind(&input.difficulties)
        .bind(&input.commitments)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_observation(&self, id: i64) -> Result<Observation, DbError> {
        let row = sqlx::query_as::<_, ObservationRow>("SELECT * FROM observations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("observation {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_observations(
        &self,
        student_id: i64,
        period: Option<i64>,
    ) -> Result<Vec<Observation>, DbError> {
        let mut f = Filter::default();
        f.push("student_id = {}", BindValue::Int(student_id));
        if let Some(period) = period {
            f.push("period = {}", BindValue::Int(period));
        }
        let sql = format!(
            "SELECT * FROM observations{} ORDER BY period ASC, created_at DESC, id DESC",
            f.sql()
        );
        let rows = bind_all_as(sqlx::query_as::<_, ObservationRow>(&sql), &f.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_observation(
        &self,
        id: i64,
        update: &UpdateObservation,
    ) -> Result<Observation, DbError> {
        let mut set = UpdateSet::default();
        for (column, value) in [
            ("strengths", &update.strengths),
            ("difficulties", &update.difficulties),
            ("commitments", &update.commitments),
        ] {
            if let Some(value) = value {
                set.set(column, BindValue::OptStr(value.clone()));
            }
        }
        if set.is_empty() {
            return self.pg_get_observation(id).await;
        }
        set.set("updated_at", BindValue::DateTime(Utc::now()));
        if set.execute(&self.pool, "observations", id).await? == 0 {
            return Err(pg_not_found(&format!("observation {id}")));
        }
        self.pg_get_observation(id).await
    }

    pub(crate) async fn pg_delete_observation(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "observations", "observation", id).await
    }
}
