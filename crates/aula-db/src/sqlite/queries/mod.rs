mod announcements;
mod areas;
mod evidence;
mod featured_plans;
mod grades;
mod groups;
mod lesson_plans;
mod observations;
mod periods;
mod plan_comments;
mod project_comments;
mod projects;
mod sessions;
mod sites;
mod students;
mod subjects;
mod users;

use rusqlite::{Connection, Row, ToSql};

use aula_core::attachment::{Attachment, AttachmentChange, FileType};

use super::{map_sqlite_err, SqliteResultExt};
use crate::DbError;

/// Turns `QueryReturnedNoRows` into `DbError::NotFound`.
pub(crate) trait NotFoundExt<T> {
    fn or_not_found(self, what: impl FnOnce() -> String) -> Result<T, DbError>;
}

impl<T> NotFoundExt<T> for rusqlite::Result<T> {
    fn or_not_found(self, what: impl FnOnce() -> String) -> Result<T, DbError> {
        match self {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(DbError::NotFound(what())),
            Err(e) => Err(map_sqlite_err(e)),
        }
    }
}

/// Attachment stored in nullable columns; `None` when `remote_id` is NULL.
pub(crate) fn optional_attachment(row: &Row) -> rusqlite::Result<Option<Attachment>> {
    let remote_id: Option<String> = row.get("remote_id")?;
    match remote_id {
        Some(_) => required_attachment(row).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn required_attachment(row: &Row) -> rusqlite::Result<Attachment> {
    let file_type: String = row.get("file_type")?;
    Ok(Attachment {
        remote_id: row.get("remote_id")?,
        file_name: row.get("file_name")?,
        file_type: FileType::parse_str(&file_type).unwrap_or(FileType::Pdf),
        size_bytes: row.get("size_bytes")?,
        view_link: row.get("view_link")?,
        embed_link: row.get("embed_link")?,
        download_link: row.get("download_link")?,
    })
}

const ATTACHMENT_COLUMNS: [&str; 7] = [
    "remote_id = ?",
    "file_name = ?",
    "file_type = ?",
    "size_bytes = ?",
    "view_link = ?",
    "embed_link = ?",
    "download_link = ?",
];

/// Push the SET clauses for one attachment, or NULLs when clearing it.
pub(crate) fn push_attachment(
    attachment: Option<&Attachment>,
    sets: &mut Vec<&'static str>,
    values: &mut Vec<Box<dyn ToSql>>,
) {
    sets.extend(ATTACHMENT_COLUMNS);
    match attachment {
        Some(a) => {
            values.push(Box::new(a.remote_id.clone()));
            values.push(Box::new(a.file_name.clone()));
            values.push(Box::new(a.file_type.as_str()));
            values.push(Box::new(a.size_bytes));
            values.push(Box::new(a.view_link.clone()));
            values.push(Box::new(a.embed_link.clone()));
            values.push(Box::new(a.download_link.clone()));
        }
        None => {
            for _ in ATTACHMENT_COLUMNS {
                values.push(Box::new(Option::<String>::None));
            }
        }
    }
}

pub(crate) fn push_attachment_change(
    change: &AttachmentChange,
    sets: &mut Vec<&'static str>,
    values: &mut Vec<Box<dyn ToSql>>,
) {
    match change {
        AttachmentChange::Keep => {}
        AttachmentChange::Remove => push_attachment(None, sets, values),
        AttachmentChange::Replace(a) => push_attachment(Some(a), sets, values),
    }
}

/// Run `UPDATE <table> SET .. WHERE id = ?` and return the changed row count.
pub(crate) fn execute_update(
    conn: &Connection,
    table: &str,
    id: i64,
    sets: &[&str],
    mut values: Vec<Box<dyn ToSql>>,
) -> Result<usize, DbError> {
    values.push(Box::new(id));
    let sql = format!("UPDATE {table} SET {} WHERE id = ?", sets.join(", "));
    let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
    conn.execute(&sql, params.as_slice()).to_db()
}

/// Collect rows for a query built with positional `?N` parameters.
pub(crate) fn query_all<T>(
    conn: &Connection,
    sql: &str,
    values: &[Box<dyn ToSql>],
    map: impl FnMut(&Row) -> rusqlite::Result<T>,
) -> Result<Vec<T>, DbError> {
    let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let mut stmt = conn.prepare(sql).to_db()?;
    let rows = stmt
        .query_map(params.as_slice(), map)
        .to_db()?
        .collect::<Result<Vec<_>, _>>()
        .to_db()?;
    Ok(rows)
}
