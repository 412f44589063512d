use chrono::{DateTime, NaiveDate, Utc};

use aula_core::attachment::{Attachment, AttachmentChange};
use aula_core::project::{CreateProject, Project, ProjectFilter, ProjectStatus, UpdateProject};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{bind_all_as, delete_by_id, AttachmentColumns, BindValue, Filter, UpdateSet};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: i64,
    teacher_id: i64,
    title: String,
    description: String,
    objectives: Option<String>,
    starts_on: NaiveDate,
    estimated_end: Option<NaiveDate>,
    #[sqlx(flatten)]
    attachment: AttachmentColumns,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(r: ProjectRow) -> Self {
        Project {
            id: r.id,
            teacher_id: r.teacher_id,
            title: r.title,
            description: r.description,
            objectives: r.objectives,
            starts_on: r.starts_on,
            estimated_end: r.estimated_end,
            attachment: r.attachment.into_optional(),
            status: ProjectStatus::parse_str(&r.status).unwrap_or_default(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_project(
        &self,
        teacher_id: i64,
        input: &CreateProject,
        attachment: Option<&Attachment>,
    ) -> Result<Project, DbError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            "INSERT INTO projects (teacher_id, title, description, objectives, starts_on,
                                   estimated_end, remote_id, file_name, file_type,
                                   size_bytes, view_link, embed_link, download_link,
                                   status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
             RETURNING *",
        )
        .bind(teacher_id)
        .bind(input.title.trim())
        .bind(input.description.trim())
        .bind(&input.objectives)
        .bind(input.starts_on)
        .bind(input.estimated_end)
        .bind(attachment.map(|a| a.remote_id.clone()))
        .bind(attachment.map(|a| a.file_name.clone()))
        .bind(attachment.map(|a| a.file_type.as_str()))
        .bind(attachment.map(|a| a.size_bytes))
        .bind(attachment.map(|a| a.view_link.clone()))
        .bind(attachment.map(|a| a.embed_link.clone()))
        .bind(attachment.map(|a| a.download_link.clone()))
        .bind(ProjectStatus::Active.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_project(&self, id: i64) -> Result<Project, DbError> {
        let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("project {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, DbError> {
        let mut f = Filter::default();
        if let Some(teacher_id) = filter.teacher_id {
            f.push("teacher_id = {}", BindValue::Int(teacher_id));
        }
        if let Some(status) = filter.status {
            f.push("status = {}", BindValue::Str(status.as_str().to_string()));
        }
        let sql = format!("SELECT * FROM projects{} ORDER BY created_at DESC, id DESC", f.sql());
        let rows = bind_all_as(sqlx::query_as::<_, ProjectRow>(&sql), &f.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_project(
        &self,
        id: i64,
        update: &UpdateProject,
        attachment: &AttachmentChange,
    ) -> Result<Project, DbError> {
        let mut set = UpdateSet::default();
        if let Some(ref title) = update.title {
            set.set("title", BindValue::Str(title.trim().to_string()));
        }
        if let Some(ref description) = update.description {
            set.set("description", BindValue::Str(description.trim().to_string()));
        }
        if let Some(ref objectives) = update.objectives {
            set.set("objectives", BindValue::OptStr(objectives.clone()));
        }
        if let Some(starts_on) = update.starts_on {
            set.set("starts_on", BindValue::Date(starts_on));
        }
        if let Some(estimated_end) = update.estimated_end {
            set.set("estimated_end", BindValue::OptDate(estimated_end));
        }
        if let Some(status) = update.status {
            set.set("status", BindValue::Str(status.as_str().to_string()));
        }
        set.attachment_change(attachment);
        if set.is_empty() {
            return self.pg_get_project(id).await;
        }
        set.set("updated_at", BindValue::DateTime(Utc::now()));
        if set.execute(&self.pool, "projects", id).await? == 0 {
            return Err(pg_not_found(&format!("project {id}")));
        }
        self.pg_get_project(id).await
    }

    pub(crate) async fn pg_delete_project(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "projects", "project", id).await
    }
}
