use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use aula_core::user::User;

use super::super::{SqliteDatabase, SqliteResultExt};
use super::users::row_to_user;
use crate::DbError;

impl SqliteDatabase {
    pub fn create_session_sync(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![token_hash, user_id, Utc::now(), expires_at],
            )
            .to_db()?;
            Ok(())
        })
    }

    /// The owner of an unexpired session.
    pub fn find_session_user_sync(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, DbError> {
        self.with_conn(|conn| {
            let expires_at: Option<(i64, DateTime<Utc>)> = conn
                .query_row(
                    "SELECT user_id, expires_at FROM sessions WHERE token_hash = ?1",
                    params![token_hash],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .to_db()?;
            let Some((user_id, expires_at)) = expires_at else {
                return Ok(None);
            };
            if expires_at <= now {
                return Ok(None);
            }
            conn.query_row(
                "SELECT * FROM users WHERE id = ?1",
                params![user_id],
                row_to_user,
            )
            .optional()
            .to_db()
        })
    }

    pub fn delete_session_sync(&self, token_hash: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM sessions WHERE token_hash = ?1",
                params![token_hash],
            )
            .to_db()?;
            Ok(())
        })
    }

    pub fn purge_expired_sessions_sync(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        self.with_conn(|conn| {
            // Compared as timestamps, not as text.
            let mut stmt = conn
                .prepare("SELECT token_hash, expires_at FROM sessions")
                .to_db()?;
            let expired: Vec<String> = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, DateTime<Utc>>(1)?))
                })
                .to_db()?
                .filter_map(|r| r.ok())
                .filter(|(_, expires_at)| *expires_at <= now)
                .map(|(hash, _)| hash)
                .collect();
            for hash in &expired {
                conn.execute("DELETE FROM sessions WHERE token_hash = ?1", params![hash])
                    .to_db()?;
            }
            Ok(expired.len() as u64)
        })
    }
}
