use chrono::{DateTime, Utc};

use aula_core::plan_comment::{CreatePlanComment, PlanComment, PlanCommentFilter};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{bind_all_as, delete_by_id, BindValue, Filter};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct PlanCommentRow {
    id: i64,
    plan_id: i64,
    author_id: i64,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PlanCommentRow> for PlanComment {
    fn from(r: PlanCommentRow) -> Self {
        PlanComment {
            id: r.id,
            plan_id: r.plan_id,
            author_id: r.author_id,
            content: r.content,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_plan_comment(
        &self,
        author_id: i64,
        input: &CreatePlanComment,
    ) -> Result<PlanComment, DbError> {
        let row = sqlx::query_as::<_, PlanCommentRow>(
            "INSERT INTO plan_comments (plan_id, author_id, content, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING *",
        )
        .bind(input.plan_id)
        .bind(author_id)
        .bind(input.content.trim())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_plan_comment(&self, id: i64) -> Result<PlanComment, DbError> {
        let row = sqlx::query_as::<_, PlanCommentRow>("SELECT * FROM plan_comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("comment {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_plan_comments(
        &self,
        filter: &PlanCommentFilter,
    ) -> Result<Vec<PlanComment>, DbError> {
        let mut f = Filter::default();
        if let Some(plan_id) = filter.plan_id {
            f.push("plan_id = {}", BindValue::Int(plan_id));
        }
        if let Some(author_id) = filter.author_id {
            f.push("author_id = {}", BindValue::Int(author_id));
        }
        if let Some(teacher_id) = filter.plan_teacher_id {
            f.push(
                "plan_id IN (SELECT id FROM lesson_plans WHERE teacher_id = {})",
                BindValue::Int(teacher_id),
            );
        }
        let sql = format!(
            "SELECT * FROM plan_comments{} ORDER BY created_at DESC, id DESC",
            f.sql()
        );
        let rows = bind_all_as(sqlx::query_as::<_, PlanCommentRow>(&sql), &f.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_plan_comment(
        &self,
        id: i64,
        content: &str,
    ) -> Result<PlanComment, DbError> {
        let row = sqlx::query_as::<_, PlanCommentRow>(
            "UPDATE plan_comments SET content = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(content.trim())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?
        .ok_or_else(|| pg_not_found(&format!("comment {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_delete_plan_comment(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "plan_comments", "comment", id).await
    }
}
