use chrono::Utc;
use rusqlite::{params, Connection, Row, ToSql};

use aula_core::attachment::{Attachment, AttachmentChange};
use aula_core::project::{CreateProject, Project, ProjectFilter, ProjectStatus, UpdateProject};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{
    execute_update, optional_attachment, push_attachment_change, query_all, NotFoundExt,
};
use crate::DbError;

fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
    let status: String = row.get("status")?;
    Ok(Project {
        id: row.get("id")?,
        teacher_id: row.get("teacher_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        objectives: row.get("objectives")?,
        starts_on: row.get("starts_on")?,
        estimated_end: row.get("estimated_end")?,
        attachment: optional_attachment(row)?,
        status: ProjectStatus::parse_str(&status).unwrap_or_default(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn select_project(conn: &Connection, id: i64) -> Result<Project, DbError> {
    conn.query_row(
        "SELECT * FROM projects WHERE id = ?1",
        params![id],
        row_to_project,
    )
    .or_not_found(|| format!("project {id}"))
}

impl SqliteDatabase {
    pub fn create_project_sync(
        &self,
        teacher_id: i64,
        input: &CreateProject,
        attachment: Option<&Attachment>,
    ) -> Result<Project, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO projects (teacher_id, title, description, objectives, starts_on,
                                       estimated_end, remote_id, file_name, file_type,
                                       size_bytes, view_link, embed_link, download_link,
                                       status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
                params![
                    teacher_id,
                    input.title.trim(),
                    input.description.trim(),
                    input.objectives,
                    input.starts_on,
                    input.estimated_end,
                    attachment.map(|a| a.remote_id.clone()),
                    attachment.map(|a| a.file_name.clone()),
                    attachment.map(|a| a.file_type.as_str()),
                    attachment.map(|a| a.size_bytes),
                    attachment.map(|a| a.view_link.clone()),
                    attachment.map(|a| a.embed_link.clone()),
                    attachment.map(|a| a.download_link.clone()),
                    ProjectStatus::Active.as_str(),
                    now
                ],
            )
            .to_db()?;
            select_project(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_project_sync(&self, id: i64) -> Result<Project, DbError> {
        self.with_conn(|conn| select_project(conn, id))
    }

    pub fn list_projects_sync(&self, filter: &ProjectFilter) -> Result<Vec<Project>, DbError> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM projects WHERE 1=1");
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();
            if let Some(teacher_id) = filter.teacher_id {
                values.push(Box::new(teacher_id));
                sql.push_str(&format!(" AND teacher_id = ?{}", values.len()));
            }
            if let Some(status) = filter.status {
                values.push(Box::new(status.as_str()));
                sql.push_str(&format!(" AND status = ?{}", values.len()));
            }
            sql.push_str(" ORDER BY created_at DESC, id DESC");
            query_all(conn, &sql, &values, row_to_project)
        })
    }

    pub fn update_project_sync(
        &self,
        id: i64,
        update: &UpdateProject,
        attachment: &AttachmentChange,
    ) -> Result<Project, DbError> {
        self.with_conn(|conn| {
            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(ref title) = update.title {
                sets.push("title = ?");
                values.push(Box::new(title.trim().to_string()));
            }
            if let Some(ref description) = update.description {
                sets.push("description = ?");
                values.push(Box::new(description.trim().to_string()));
            }
            if let Some(ref objectives) = update.objectives {
                sets.push("objectives = ?");
                values.push(Box::new(objectives.clone()));
            }
            if let Some(starts_on) = update.starts_on {
                sets.push("starts_on = ?");
                values.push(Box::new(starts_on));
            }
            if let Some(estimated_end) = update.estimated_end {
                sets.push("estimated_end = ?");
                values.push(Box::new(estimated_end));
            }
            if let Some(status) = update.status {
                sets.push("status = ?");
                values.push(Box::new(status.as_str()));
            }
            push_attachment_change(attachment, &mut sets, &mut values);

            if sets.is_empty() {
                return select_project(conn, id);
            }
            sets.push("updated_at = ?");
            values.push(Box::new(Utc::now()));
            if execute_update(conn, "projects", id, &sets, values)? == 0 {
                return Err(DbError::NotFound(format!("project {id}")));
            }
            select_project(conn, id)
        })
    }

    pub fn delete_project_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM projects WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("project {id}")));
            }
            Ok(())
        })
    }
}
