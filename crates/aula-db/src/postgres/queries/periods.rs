use chrono::{DateTime, NaiveDate, Utc};

use aula_core::period::{Period, PeriodActivationPolicy, UpdatePeriod};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{BindValue, UpdateSet};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct PeriodRow {
    id: i64,
    name: String,
    starts_on: Option<NaiveDate>,
    ends_on: Option<NaiveDate>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PeriodRow> for Period {
    fn from(r: PeriodRow) -> Self {
        Period {
            id: r.id,
            name: r.name,
            starts_on: r.starts_on,
            ends_on: r.ends_on,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_list_periods(&self) -> Result<Vec<Period>, DbError> {
        let rows = sqlx::query_as::<_, PeriodRow>("SELECT * FROM periods ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_get_period(&self, id: i64) -> Result<Period, DbError> {
        let row = sqlx::query_as::<_, PeriodRow>("SELECT * FROM periods WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("period {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_active_period(&self) -> Result<Option<Period>, DbError> {
        let row = sqlx::query_as::<_, PeriodRow>("SELECT * FROM periods WHERE active LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(row.map(|r| r.into()))
    }

    pub(crate) async fn pg_update_period(
        &self,
        id: i64,
        update: &UpdatePeriod,
        policy: PeriodActivationPolicy,
    ) -> Result<Period, DbError> {
        let mut tx = self.pool.begin().await.map_err(pg_err)?;
        let now = Utc::now();

        // Row locks keep concurrent activations from interleaving.
        let current = sqlx::query_as::<_, PeriodRow>("SELECT * FROM periods WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("period {id}")))?;

        if update.active == Some(true) && !current.active {
            let other: Option<String> = sqlx::query_scalar(
                "SELECT name FROM periods WHERE active AND id <> $1 FOR UPDATE",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(pg_err)?;
            if let Some(other) = other {
                match policy {
                    PeriodActivationPolicy::ExclusiveLock => {
                        return Err(DbError::Conflict(format!("period {other} is already active")));
                    }
                    PeriodActivationPolicy::AutoDeactivate => {
                        sqlx::query(
                            "UPDATE periods SET active = FALSE, updated_at = $1
                             WHERE active AND id <> $2",
                        )
                        .bind(now)
                        .bind(id)
                        .execute(&mut *tx)
                        .await
                        .map_err(pg_err)?;
                    }
                }
            }
        }

        let mut set = UpdateSet::default();
        if let Some(starts_on) = update.starts_on {
            set.set("starts_on", BindValue::OptDate(starts_on));
        }
        if let Some(ends_on) = update.ends_on {
            set.set("ends_on", BindValue::OptDate(ends_on));
        }
        if let Some(active) = update.active {
            set.set("active", BindValue::Bool(active));
        }
        if !set.is_empty() {
            set.set("updated_at", BindValue::DateTime(now));
            set.execute(&mut *tx, "periods", id).await?;
        }

        let row = sqlx::query_as::<_, PeriodRow>("SELECT * FROM periods WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(pg_err)?;
        tx.commit().await.map_err(pg_err)?;

        Ok(row.into())
    }
}
