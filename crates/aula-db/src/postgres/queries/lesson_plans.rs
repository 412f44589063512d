use chrono::{DateTime, Utc};

use aula_core::attachment::Attachment;
use aula_core::lesson_plan::{LessonPlan, LessonPlanFilter, NewLessonPlan, UpdateLessonPlan};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{bind_all_as, delete_by_id, AttachmentColumns, BindValue, Filter, UpdateSet};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct LessonPlanRow {
    id: i64,
    teacher_id: i64,
    subject_id: i64,
    site_id: i64,
    period_id: i64,
    title: String,
    #[sqlx(flatten)]
    attachment: AttachmentColumns,
    uploaded_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LessonPlanRow> for LessonPlan {
    fn from(r: LessonPlanRow) -> Self {
        LessonPlan {
            id: r.id,
            teacher_id: r.teacher_id,
            subject_id: r.subject_id,
            site_id: r.site_id,
            period_id: r.period_id,
            title: r.title,
            attachment: r.attachment.into_required(),
            uploaded_at: r.uploaded_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_lesson_plan(
        &self,
        input: &NewLessonPlan,
    ) -> Result<LessonPlan, DbError> {
        let a = &input.attachment;
        let row = sqlx::query_as::<_, LessonPlanRow>(
            "INSERT INTO lesson_plans (teacher_id, subject_id, site_id, period_id, title,
                                       remote_id, file_name, file_type, size_bytes,
                                       view_link, embed_link, download_link,
                                       uploaded_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13, $13)
             RETURNING *",
        )
        .bind(input.teacher_id)
        .bind(input.subject_id)
        .bind(input.site_id)
        .bind(input.period_id)
        .bind(input.title.trim())
        .bind(&a.remote_id)
        .bind(&a.file_name)
        .bind(a.file_type.as_str())
        .bind(a.size_bytes)
        .bind(&a.view_link)
        .bind(&a.embed_link)
        .bind(&a.download_link)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_lesson_plan(&self, id: i64) -> Result<LessonPlan, DbError> {
        let row = sqlx::query_as::<_, LessonPlanRow>("SELECT * FROM lesson_plans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("lesson plan {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_lesson_plans(
        &self,
        filter: &LessonPlanFilter,
    ) -> Result<Vec<LessonPlan>, DbError> {
        let mut f = Filter::default();
        for (column, value) in [
            ("teacher_id = {}", filter.teacher_id),
            ("subject_id = {}", filter.subject_id),
            ("site_id = {}", filter.site_id),
            ("period_id = {}", filter.period_id),
        ] {
            if let Some(value) = value {
                f.push(column, BindValue::Int(value));
            }
        }
        let sql = format!(
            "SELECT * FROM lesson_plans{} ORDER BY created_at DESC, id DESC",
            f.sql()
        );
        let rows = bind_all_as(sqlx::query_as::<_, LessonPlanRow>(&sql), &f.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_lesson_plan(
        &self,
        id: i64,
        update: &UpdateLessonPlan,
        attachment: Option<&Attachment>,
    ) -> Result<LessonPlan, DbError> {
        let now = Utc::now();
        let mut set = UpdateSet::default();
        if let Some(ref title) = update.title {
            set.set("title", BindValue::Str(title.trim().to_string()));
        }
        if let Some(subject_id) = update.subject_id {
            set.set("subject_id", BindValue::Int(subject_id));
        }
        if let Some(period_id) = update.period_id {
            set.set("period_id", BindValue::Int(period_id));
        }
        if let Some(a) = attachment {
            set.attachment(Some(a));
            set.set("uploaded_at", BindValue::DateTime(now));
        }
        if set.is_empty() {
            return self.pg_get_lesson_plan(id).await;
        }
        set.set("updated_at", BindValue::DateTime(now));
        if set.execute(&self.pool, "lesson_plans", id).await? == 0 {
            return Err(pg_not_found(&format!("lesson plan {id}")));
        }
        self.pg_get_lesson_plan(id).await
    }

    pub(crate) async fn pg_delete_lesson_plan(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "lesson_plans", "lesson plan", id).await
    }
}
