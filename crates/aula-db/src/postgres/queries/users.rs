use chrono::{DateTime, Utc};

use aula_core::role::Role;
use aula_core::user::{CreateUser, UpdateUser, User, UserFilter};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{bind_all_as, BindValue, Filter, UpdateSet};
use crate::DbError;

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: i64,
    email: String,
    full_name: String,
    national_id: String,
    role: String,
    active: bool,
    phone: Option<String>,
    site_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            email: r.email,
            full_name: r.full_name,
            national_id: r.national_id,
            role: Role::parse_str(&r.role).unwrap_or(Role::Teacher),
            active: r.active,
            phone: r.phone,
            site_id: r.site_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_user(
        &self,
        input: &CreateUser,
        password_hash: &str,
    ) -> Result<User, DbError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (email, full_name, national_id, password_hash, role, active,
                                phone, site_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING *",
        )
        .bind(input.email.trim())
        .bind(input.full_name.trim())
        .bind(input.national_id.trim())
        .bind(password_hash)
        .bind(input.role.as_str())
        .bind(input.active)
        .bind(&input.phone)
        .bind(input.site_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_user(&self, id: i64) -> Result<User, DbError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("user {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_users(&self, filter: &UserFilter) -> Result<Vec<User>, DbError> {
        let mut f = Filter::default();
        if let Some(role) = filter.role {
            f.push("role = {}", BindValue::Str(role.as_str().to_string()));
        }
        if let Some(active) = filter.active {
            f.push("active = {}", BindValue::Bool(active));
        }
        let sql = format!("SELECT * FROM users{} ORDER BY full_name ASC, id ASC", f.sql());
        let rows = bind_all_as(sqlx::query_as::<_, UserRow>(&sql), &f.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_user(
        &self,
        id: i64,
        update: &UpdateUser,
        password_hash: Option<&str>,
    ) -> Result<User, DbError> {
        let mut set = UpdateSet::default();
        if let Some(ref email) = update.email {
            set.set("email", BindValue::Str(email.trim().to_string()));
        }
        if let Some(ref full_name) = update.full_name {
            set.set("full_name", BindValue::Str(full_name.trim().to_string()));
        }
        if let Some(role) = update.role {
            set.set("role", BindValue::Str(role.as_str().to_string()));
        }
        if let Some(active) = update.active {
            set.set("active", BindValue::Bool(active));
        }
        if let Some(ref phone) = update.phone {
            set.set("phone", BindValue::OptStr(phone.clone()));
        }
        if let Some(site_id) = update.site_id {
            set.set("site_id", BindValue::OptInt(site_id));
        }
        if let Some(hash) = password_hash {
            set.set("password_hash", BindValue::Str(hash.to_string()));
        }
        if set.is_empty() {
            return self.pg_get_user(id).await;
        }
        set.set("updated_at", BindValue::DateTime(Utc::now()));
        if set.execute(&self.pool, "users", id).await? == 0 {
            return Err(pg_not_found(&format!("user {id}")));
        }
        self.pg_get_user(id).await
    }

    pub(crate) async fn pg_find_credentials(
        &self,
        national_id: &str,
    ) -> Result<Option<(User, String)>, DbError> {
        let row = sqlx::query_as::<_, CredentialRow>("SELECT * FROM users WHERE national_id = $1")
            .bind(national_id.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(row.map(|r| (r.user.into(), r.password_hash)))
    }

    pub(crate) async fn pg_count_users(&self) -> Result<i64, DbError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(pg_err)
    }
}
