use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use crate::DbError;

/// Fixed key for the advisory lock that serialises migration runs.
const MIGRATION_LOCK_KEY: i64 = 0x6175_6C61_5F64_6231; // "aula_db1"

fn internal(e: sqlx::Error) -> DbError {
    DbError::Internal(e.to_string())
}

/// Session-level advisory locks belong to one connection, so the whole run
/// happens on a single pooled connection.
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    let mut conn = pool.acquire().await.map_err(internal)?;

    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await
        .map_err(internal)?;

    let result = run_inner(&mut conn).await;

    let _ = sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await;

    result
}

async fn run_inner(conn: &mut PgConnection) -> Result<(), DbError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(&mut *conn)
    .await
    .map_err(internal)?;

    let current: i32 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
        .fetch_one(&mut *conn)
        .await
        .map_err(internal)?;

    debug!(current, "postgres schema version");
    if current < 1 {
        info!("applying postgres migration v1");
        sqlx::raw_sql(include_str!("sql/V1__initial.sql"))
            .execute(&mut *conn)
            .await
            .map_err(internal)?;
    }

    Ok(())
}
