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

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::{Query, QueryAs};
use sqlx::Postgres;

use aula_core::attachment::{Attachment, AttachmentChange, FileType};

use super::pg_err;
use crate::DbError;

/// A dynamically bound parameter.
pub(crate) enum BindValue {
    Int(i64),
    OptInt(Option<i64>),
    Bool(bool),
    Str(String),
    OptStr(Option<String>),
    Date(NaiveDate),
    OptDate(Option<NaiveDate>),
    DateTime(DateTime<Utc>),
}

pub(crate) fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    binds: &'q [BindValue],
) -> Query<'q, Postgres, PgArguments> {
    for bind in binds {
        query = match bind {
            BindValue::Int(v) => query.bind(v),
            BindValue::OptInt(v) => query.bind(v),
            BindValue::Bool(v) => query.bind(v),
            BindValue::Str(v) => query.bind(v),
            BindValue::OptStr(v) => query.bind(v),
            BindValue::Date(v) => query.bind(v),
            BindValue::OptDate(v) => query.bind(v),
            BindValue::DateTime(v) => query.bind(v),
        };
    }
    query
}

pub(crate) fn bind_all_as<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    binds: &'q [BindValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for bind in binds {
        query = match bind {
            BindValue::Int(v) => query.bind(v),
            BindValue::OptInt(v) => query.bind(v),
            BindValue::Bool(v) => query.bind(v),
            BindValue::Str(v) => query.bind(v),
            BindValue::OptStr(v) => query.bind(v),
            BindValue::Date(v) => query.bind(v),
            BindValue::OptDate(v) => query.bind(v),
            BindValue::DateTime(v) => query.bind(v),
        };
    }
    query
}

/// `WHERE` clause accumulator with `$n` placeholders.
#[derive(Default)]
pub(crate) struct Filter {
    pub(crate) clauses: Vec<String>,
    pub(crate) binds: Vec<BindValue>,
}

impl Filter {
    /// `template` holds one `{}` that receives the placeholder.
    pub(crate) fn push(&mut self, template: &str, value: BindValue) {
        self.binds.push(value);
        let placeholder = format!("${}", self.binds.len());
        self.clauses.push(template.replace("{}", &placeholder));
    }

    pub(crate) fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

/// `SET` clause accumulator for partial updates.
#[derive(Default)]
pub(crate) struct UpdateSet {
    sets: Vec<String>,
    binds: Vec<BindValue>,
}

impl UpdateSet {
    pub(crate) fn set(&mut self, column: &str, value: BindValue) {
        self.binds.push(value);
        self.sets.push(format!("{column} = ${}", self.binds.len()));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub(crate) fn attachment(&mut self, attachment: Option<&Attachment>) {
        self.set("remote_id", BindValue::OptStr(attachment.map(|a| a.remote_id.clone())));
        self.set("file_name", BindValue::OptStr(attachment.map(|a| a.file_name.clone())));
        self.set(
            "file_type",
            BindValue::OptStr(attachment.map(|a| a.file_type.as_str().to_string())),
        );
        self.set("size_bytes", BindValue::OptInt(attachment.map(|a| a.size_bytes)));
        self.set("view_link", BindValue::OptStr(attachment.map(|a| a.view_link.clone())));
        self.set("embed_link", BindValue::OptStr(attachment.map(|a| a.embed_link.clone())));
        self.set(
            "download_link",
            BindValue::OptStr(attachment.map(|a| a.download_link.clone())),
        );
    }

    pub(crate) fn attachment_change(&mut self, change: &AttachmentChange) {
        match change {
            AttachmentChange::Keep => {}
            AttachmentChange::Remove => self.attachment(None),
            AttachmentChange::Replace(a) => self.attachment(Some(a)),
        }
    }

    /// Run the update and return the affected row count.
    pub(crate) async fn execute<'c, E>(
        mut self,
        executor: E,
        table: &str,
        id: i64,
    ) -> Result<u64, DbError>
    where
        E: sqlx::Executor<'c, Database = Postgres>,
    {
        self.binds.push(BindValue::Int(id));
        let sql = format!(
            "UPDATE {table} SET {} WHERE id = ${}",
            self.sets.join(", "),
            self.binds.len()
        );
        let result = bind_all(sqlx::query(&sql), &self.binds)
            .execute(executor)
            .await
            .map_err(pg_err)?;
        Ok(result.rows_affected())
    }
}

/// The seven attachment columns shared by every table that stores one.
#[derive(sqlx::FromRow)]
pub(crate) struct AttachmentColumns {
    remote_id: Option<String>,
    file_name: Option<String>,
    file_type: Option<String>,
    size_bytes: Option<i64>,
    view_link: Option<String>,
    embed_link: Option<String>,
    download_link: Option<String>,
}

impl AttachmentColumns {
    pub(crate) fn into_optional(self) -> Option<Attachment> {
        if self.remote_id.is_none() {
            return None;
        }
        Some(self.into_required())
    }

    /// For tables whose attachment columns are NOT NULL.
    pub(crate) fn into_required(self) -> Attachment {
        Attachment {
            remote_id: self.remote_id.unwrap_or_default(),
            file_name: self.file_name.unwrap_or_default(),
            file_type: self
                .file_type
                .as_deref()
                .and_then(FileType::parse_str)
                .unwrap_or(FileType::Pdf),
            size_bytes: self.size_bytes.unwrap_or_default(),
            view_link: self.view_link.unwrap_or_default(),
            embed_link: self.embed_link.unwrap_or_default(),
            download_link: self.download_link.unwrap_or_default(),
        }
    }
}

/// `DELETE FROM <table> WHERE id = $1`, NotFound when nothing matched.
pub(crate) async fn delete_by_id(
    pool: &sqlx::PgPool,
    table: &str,
    entity: &str,
    id: i64,
) -> Result<(), DbError> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(pool)
        .await
        .map_err(pg_err)?;
    if result.rows_affected() == 0 {
        return Err(super::pg_not_found(&format!("{entity} {id}")));
    }
    Ok(())
}
