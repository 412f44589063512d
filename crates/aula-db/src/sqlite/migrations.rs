use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::DbError;

fn internal(e: rusqlite::Error) -> DbError {
    DbError::Internal(e.to_string())
}

pub fn run(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )
    .map_err(internal)?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .map_err(internal)?;

    debug!(current_version, "sqlite schema version");
    if current_version < 1 {
        info!("applying sqlite migration v1");
        conn.execute_batch(V1_INITIAL).map_err(internal)?;
        seed_periods(conn)?;
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (1, datetime('now'))",
            [],
        )
        .map_err(internal)?;
    }

    Ok(())
}

/// The four academic terms exist from the start, all inactive.
fn seed_periods(conn: &Connection) -> Result<(), DbError> {
    let now = Utc::now();
    for name in ["1", "2", "3", "4"] {
        conn.execute(
            "INSERT OR IGNORE INTO periods (name, active, created_at, updated_at)
             VALUES (?1, 0, ?2, ?2)",
            params![name, now],
        )
        .map_err(internal)?;
    }
    Ok(())
}

const V1_INITIAL: &str = "
    CREATE TABLE IF NOT EXISTS sites (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL UNIQUE,
        code        TEXT NOT NULL UNIQUE,
        address     TEXT,
        active      INTEGER NOT NULL DEFAULT 1,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        email         TEXT NOT NULL UNIQUE,
        full_name     TEXT NOT NULL,
        national_id   TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role          TEXT NOT NULL
                          CHECK(role IN ('docente', 'coordinador', 'rector')),
        active        INTEGER NOT NULL DEFAULT 1,
        phone         TEXT,
        site_id       INTEGER REFERENCES sites(id) ON DELETE SET NULL,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
        token_hash  TEXT PRIMARY KEY,
        user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at  TEXT NOT NULL,
        expires_at  TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

    CREATE TABLE IF NOT EXISTS areas (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL UNIQUE,
        description TEXT,
        active      INTEGER NOT NULL DEFAULT 1,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS subjects (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        area_id     INTEGER NOT NULL REFERENCES areas(id),
        code        TEXT UNIQUE,
        description TEXT,
        grades      TEXT,
        active      INTEGER NOT NULL DEFAULT 1,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL,
        UNIQUE (name, area_id)
    );

    CREATE TABLE IF NOT EXISTS teacher_subjects (
        teacher_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        subject_id  INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
        created_at  TEXT NOT NULL,
        PRIMARY KEY (teacher_id, subject_id)
    );

    CREATE TABLE IF NOT EXISTS grades (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        site_id     INTEGER NOT NULL REFERENCES sites(id),
        name        TEXT NOT NULL,
        code        TEXT,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL,
        UNIQUE (site_id, name)
    );

    CREATE TABLE IF NOT EXISTS class_groups (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        grade_id    INTEGER NOT NULL REFERENCES grades(id),
        name        TEXT NOT NULL,
        code        TEXT,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL,
        UNIQUE (grade_id, name)
    );

    CREATE TABLE IF NOT EXISTS group_directors (
        teacher_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        group_id    INTEGER NOT NULL REFERENCES class_groups(id) ON DELETE CASCADE,
        created_at  TEXT NOT NULL,
        PRIMARY KEY (teacher_id, group_id)
    );

    CREATE TABLE IF NOT EXISTS students (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id        INTEGER NOT NULL REFERENCES class_groups(id),
        document_number TEXT NOT NULL,
        first_names     TEXT NOT NULL,
        last_names      TEXT NOT NULL,
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL,
        UNIQUE (group_id, document_number)
    );

    CREATE TABLE IF NOT EXISTS periods (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL UNIQUE,
        starts_on   TEXT,
        ends_on     TEXT,
        active      INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_periods_single_active
        ON periods(active) WHERE active = 1;

    CREATE TABLE IF NOT EXISTS lesson_plans (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        teacher_id    INTEGER NOT NULL REFERENCES users(id),
        subject_id    INTEGER NOT NULL REFERENCES subjects(id),
        site_id       INTEGER NOT NULL REFERENCES sites(id),
        period_id     INTEGER NOT NULL REFERENCES periods(id),
        title         TEXT NOT NULL,
        remote_id     TEXT NOT NULL UNIQUE,
        file_name     TEXT NOT NULL,
        file_type     TEXT NOT NULL CHECK(file_type IN ('pdf', 'doc', 'docx')),
        size_bytes    INTEGER NOT NULL,
        view_link     TEXT NOT NULL,
        embed_link    TEXT NOT NULL,
        download_link TEXT NOT NULL,
        uploaded_at   TEXT NOT NULL,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_lesson_plans_teacher ON lesson_plans(teacher_id);
    CREATE INDEX IF NOT EXISTS idx_lesson_plans_period  ON lesson_plans(period_id);

    CREATE TABLE IF NOT EXISTS plan_comments (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        plan_id     INTEGER NOT NULL REFERENCES lesson_plans(id) ON DELETE CASCADE,
        author_id   INTEGER NOT NULL REFERENCES users(id),
        content     TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_plan_comments_plan ON plan_comments(plan_id);

    CREATE TABLE IF NOT EXISTS featured_plans (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        plan_id     INTEGER NOT NULL UNIQUE REFERENCES lesson_plans(id) ON DELETE CASCADE,
        featured_by INTEGER NOT NULL REFERENCES users(id),
        reason      TEXT NOT NULL,
        active      INTEGER NOT NULL DEFAULT 1,
        views       INTEGER NOT NULL DEFAULT 0,
        featured_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS projects (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        teacher_id    INTEGER NOT NULL REFERENCES users(id),
        title         TEXT NOT NULL,
        description   TEXT NOT NULL,
        objectives    TEXT,
        starts_on     TEXT NOT NULL,
        estimated_end TEXT,
        remote_id     TEXT UNIQUE,
        file_name     TEXT,
        file_type     TEXT,
        size_bytes    INTEGER,
        view_link     TEXT,
        embed_link    TEXT,
        download_link TEXT,
        status        TEXT NOT NULL DEFAULT 'active'
                          CHECK(status IN ('active', 'paused', 'completed', 'cancelled')),
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_projects_teacher ON projects(teacher_id);

    CREATE TABLE IF NOT EXISTS evidence (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id    INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        title         TEXT NOT NULL,
        description   TEXT,
        evidence_date TEXT NOT NULL,
        remote_id     TEXT NOT NULL UNIQUE,
        file_name     TEXT NOT NULL,
        file_type     TEXT NOT NULL,
        size_bytes    INTEGER NOT NULL,
        view_link     TEXT NOT NULL,
        embed_link    TEXT NOT NULL,
        download_link TEXT NOT NULL,
        uploaded_by   INTEGER NOT NULL REFERENCES users(id),
        created_at    TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_evidence_project ON evidence(project_id);

    CREATE TABLE IF NOT EXISTS project_comments (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id  INTEGER REFERENCES projects(id) ON DELETE CASCADE,
        evidence_id INTEGER REFERENCES evidence(id) ON DELETE CASCADE,
        author_id   INTEGER NOT NULL REFERENCES users(id),
        content     TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL,
        CHECK ((project_id IS NULL) <> (evidence_id IS NULL))
    );
    CREATE INDEX IF NOT EXISTS idx_project_comments_project  ON project_comments(project_id);
    CREATE INDEX IF NOT EXISTS idx_project_comments_evidence ON project_comments(evidence_id);

    CREATE TABLE IF NOT EXISTS observations (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id   INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        teacher_id   INTEGER NOT NULL REFERENCES users(id),
        period       INTEGER NOT NULL CHECK(period BETWEEN 1 AND 4),
        strengths    TEXT,
        difficulties TEXT,
        commitments  TEXT,
        created_at   TEXT NOT NULL,
        updated_at   TEXT NOT NULL,
        UNIQUE (student_id, teacher_id, period)
    );

    CREATE TABLE IF NOT EXISTS announcements (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        author_id     INTEGER NOT NULL REFERENCES users(id),
        title         TEXT NOT NULL,
        content       TEXT NOT NULL,
        remote_id     TEXT UNIQUE,
        file_name     TEXT,
        file_type     TEXT,
        size_bytes    INTEGER,
        view_link     TEXT,
        embed_link    TEXT,
        download_link TEXT,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    );
";
