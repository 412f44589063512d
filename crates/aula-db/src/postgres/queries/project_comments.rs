use chrono::{DateTime, Utc};

use aula_core::project_comment::{CommentTarget, ProjectComment};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::delete_by_id;
use crate::DbError;

#[derive(sqlx::FromRow)]
struct ProjectCommentRow {
    id: i64,
    project_id: Option<i64>,
    evidence_id: Option<i64>,
    author_id: i64,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectCommentRow> for ProjectComment {
    type Error = DbError;

    fn try_from(r: ProjectCommentRow) -> Result<Self, DbError> {
        let target = CommentTarget::from_columns(r.project_id, r.evidence_id).ok_or_else(|| {
            DbError::Internal(format!("project comment {} has no single target", r.id))
        })?;
        Ok(ProjectComment {
            id: r.id,
            target,
            author_id: r.author_id,
            content: r.content,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_project_comment(
        &self,
        author_id: i64,
        target: CommentTarget,
        content: &str,
    ) -> Result<ProjectComment, DbError> {
        let row = sqlx::query_as::<_, ProjectCommentRow>(
            "INSERT INTO project_comments (project_id, evidence_id, author_id, content,
                                           created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING *",
        )
        .bind(target.project_id())
        .bind(target.evidence_id())
        .bind(author_id)
        .bind(content.trim())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        row.try_into()
    }

    pub(crate) async fn pg_get_project_comment(&self, id: i64) -> Result<ProjectComment, DbError> {
        let row =
            sqlx::query_as::<_, ProjectCommentRow>("SELECT * FROM project_comments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(pg_err)?
                .ok_or_else(|| pg_not_found(&format!("project comment {id}")))?;

        row.try_into()
    }

    pub(crate) async fn pg_list_project_comments(
        &self,
        target: CommentTarget,
    ) -> Result<Vec<ProjectComment>, DbError> {
        let (sql, id) = match target {
            CommentTarget::Project(id) => (
                "SELECT * FROM project_comments WHERE project_id = $1
                 ORDER BY created_at ASC, id ASC",
                id,
            ),
            CommentTarget::Evidence(id) => (
                "SELECT * FROM project_comments WHERE evidence_id = $1
                 ORDER BY created_at ASC, id ASC",
                id,
            ),
        };
        let rows = sqlx::query_as::<_, ProjectCommentRow>(sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        rows.into_iter().map(ProjectComment::try_from).collect()
    }

    pub(crate) async fn pg_update_project_comment(
        &self,
        id: i64,
        content: &str,
    ) -> Result<ProjectComment, DbError> {
        let row = sqlx::query_as::<_, ProjectCommentRow>(
            "UPDATE project_comments SET content = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(content.trim())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?
        .ok_or_else(|| pg_not_found(&format!("project comment {id}")))?;

        row.try_into()
    }

    pub(crate) async fn pg_delete_project_comment(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "project_comments", "project comment", id).await
    }
}
