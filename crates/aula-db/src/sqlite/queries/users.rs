use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use aula_core::role::Role;
use aula_core::user::{CreateUser, UpdateUser, User, UserFilter};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{execute_update, query_all, NotFoundExt};
use crate::DbError;

const USER_COLUMNS: &str = "id, email, full_name, national_id, role, active, phone, site_id, \
                            created_at, updated_at";

pub(crate) fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let role: String = row.get("role")?;
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        full_name: row.get("full_name")?,
        national_id: row.get("national_id")?,
        role: Role::parse_str(&role).unwrap_or(Role::Teacher),
        active: row.get("active")?,
        phone: row.get("phone")?,
        site_id: row.get("site_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_user(conn: &Connection, id: i64) -> Result<User, DbError> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        row_to_user,
    )
    .or_not_found(|| format!("user {id}"))
}

impl SqliteDatabase {
    pub fn create_user_sync(&self, input: &CreateUser, password_hash: &str) -> Result<User, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO users (email, full_name, national_id, password_hash, role, active,
                                    phone, site_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    input.email.trim(),
                    input.full_name.trim(),
                    input.national_id.trim(),
                    password_hash,
                    input.role.as_str(),
                    input.active,
                    input.phone,
                    input.site_id,
                    now
                ],
            )
            .to_db()?;
            select_user(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_user_sync(&self, id: i64) -> Result<User, DbError> {
        self.with_conn(|conn| select_user(conn, id))
    }

    pub fn list_users_sync(&self, filter: &UserFilter) -> Result<Vec<User>, DbError> {
        self.with_conn(|conn| {
            let mut sql = format!("SELECT {USER_COLUMNS} FROM users WHERE 1=1");
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();
            if let Some(role) = filter.role {
                values.push(Box::new(role.as_str()));
                sql.push_str(&format!(" AND role = ?{}", values.len()));
            }
            if let Some(active) = filter.active {
                values.push(Box::new(active));
                sql.push_str(&format!(" AND active = ?{}", values.len()));
            }
            sql.push_str(" ORDER BY full_name ASC, id ASC");
            query_all(conn, &sql, &values, row_to_user)
        })
    }

    pub fn update_user_sync(
        &self,
        id: i64,
        update: &UpdateUser,
        password_hash: Option<&str>,
    ) -> Result<User, DbError> {
        self.with_conn(|conn| {
            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(ref email) = update.email {
                sets.push("email = ?");
                values.push(Box::new(email.trim().to_string()));
            }
            if let Some(ref full_name) = update.full_name {
                sets.push("full_name = ?");
                values.push(Box::new(full_name.trim().to_string()));
            }
            if let Some(role) = update.role {
                sets.push("role = ?");
                values.push(Box::new(role.as_str()));
            }
            if let Some(active) = update.active {
                sets.push("active = ?");
                values.push(Box::new(active));
            }
            if let Some(ref phone) = update.phone {
                sets.push("phone = ?");
                values.push(Box::new(phone.clone()));
            }
            if let Some(site_id) = update.site_id {
                sets.push("site_id = ?");
                values.push(Box::new(site_id));
            }
            if let Some(hash) = password_hash {
                sets.push("password_hash = ?");
                values.push(Box::new(hash.to_string()));
            }

            if sets.is_empty() {
                return select_user(conn, id);
            }

            sets.push("updated_at = ?");
            values.push(Box::new(Utc::now()));
            if execute_update(conn, "users", id, &sets, values)? == 0 {
                return Err(DbError::NotFound(format!("user {id}")));
            }
            select_user(conn, id)
        })
    }

    pub fn find_credentials_sync(
        &self,
        national_id: &str,
    ) -> Result<Option<(User, String)>, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE national_id = ?1"),
                params![national_id.trim()],
                |row| Ok((row_to_user(row)?, row.get::<_, String>("password_hash")?)),
            )
            .optional()
            .to_db()
        })
    }

    pub fn count_users_sync(&self) -> Result<i64, DbError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .to_db()
        })
    }
}
