use chrono::{DateTime, Utc};

use aula_core::area::{Area, CreateArea, UpdateArea};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{delete_by_id, BindValue, UpdateSet};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct AreaRow {
    id: i64,
    name: String,
    description: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AreaRow> for Area {
    fn from(r: AreaRow) -> Self {
        Area {
            id: r.id,
            name: r.name,
            description: r.description,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_area(&self, input: &CreateArea) -> Result<Area, DbError> {
        let row = sqlx::query_as::<_, AreaRow>(
            "INSERT INTO areas (name, description, active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING *",
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.active)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_area(&self, id: i64) -> Result<Area, DbError> {
        let row = sqlx::query_as::<_, AreaRow>("SELECT * FROM areas WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("area {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_areas(&self) -> Result<Vec<Area>, DbError> {
        let rows = sqlx::query_as::<_, AreaRow>("SELECT * FROM areas ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_area(&self, id: i64, update: &UpdateArea) -> Result<Area, DbError> {
        let mut set = UpdateSet::default();
        if let Some(ref name) = update.name {
            set.set("name", BindValue::Str(name.trim().to_string()));
        }
        if let Some(ref description) = update.description {
            set.set("description", BindValue::OptStr(description.clone()));
        }
        if let Some(active) = update.active {
            set.set("active", BindValue::Bool(active));
        }
        if set.is_empty() {
            return self.pg_get_area(id).await;
        }
        set.set("updated_at", BindValue::DateTime(Utc::now()));
        if set.execute(&self.pool, "areas", id).await? == 0 {
            return Err(pg_not_found(&format!("area {id}")));
        }
        self.pg_get_area(id).await
    }

    pub(crate) async fn pg_delete_area(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "areas", "area", id).await
    }
}
