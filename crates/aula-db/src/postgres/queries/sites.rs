use chrono::{DateTime, Utc};

use aula_core::site::{CreateSite, Site, UpdateSite};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{delete_by_id, BindValue, UpdateSet};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct SiteRow {
    id: i64,
    name: String,
    code: String,
    address: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SiteRow> for Site {
    fn from(r: SiteRow) -> Self {
        Site {
            id: r.id,
            name: r.name,
            code: r.code,
            address: r.address,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_site(&self, input: &CreateSite) -> Result<Site, DbError> {
        let row = sqlx::query_as::<_, SiteRow>(
            "INSERT INTO sites (name, code, address, active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING *",
        )
        .bind(input.name.trim())
        .bind(input.code.trim())
        .bind(&input.address)
        .bind(input.active)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_site(&self, id: i64) -> Result<Site, DbError> {
        let row = sqlx::query_as::<_, SiteRow>("SELECT * FROM sites WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("site {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_sites(&self) -> Result<Vec<Site>, DbError> {
        let rows = sqlx::query_as::<_, SiteRow>("SELECT * FROM sites ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_site(&self, id: i64, update: &UpdateSite) -> Result<Site, DbError> {
        let mut set = UpdateSet::default();
        if let Some(ref name) = update.name {
            set.set("name", BindValue::Str(name.trim().to_string()));
        }
        if let Some(ref code) = update.code {
            set.set("code", BindValue::Str(code.trim().to_string()));
        }
        if let Some(ref address) = update.address {
            set.set("address", BindValue::OptStr(address.clone()));
        }
        if let Some(active) = update.active {
            set.set("active", BindValue::Bool(active));
        }
        if set.is_empty() {
            return self.pg_get_site(id).await;
        }
        set.set("updated_at", BindValue::DateTime(Utc::now()));
        if set.execute(&self.pool, "sites", id).await? == 0 {
            return Err(pg_not_found(&format!("site {id}")));
        }
        self.pg_get_site(id).await
    }

    pub(crate) async fn pg_delete_site(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "sites", "site", id).await
    }
}
