use chrono::{DateTime, Utc};

use aula_core::featured_plan::{
    CreateFeaturedPlan, FeaturedPlan, FeaturedPlanDetail, UpdateFeaturedPlan,
};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{delete_by_id, BindValue, UpdateSet};
use crate::DbError;

const DETAIL_SELECT: &str = "SELECT f.*,
        lp.title     AS plan_title,
        lp.file_name AS plan_file_name,
        lp.view_link AS plan_view_link,
        u.full_name  AS teacher_name,
        s.name       AS subject_name,
        st.name      AS site_name
     FROM featured_plans f
     JOIN lesson_plans lp ON lp.id = f.plan_id
     JOIN users u         ON u.id = lp.teacher_id
     JOIN subjects s      ON s.id = lp.subject_id
     JOIN sites st        ON st.id = lp.site_id";

#[derive(sqlx::FromRow)]
struct FeaturedRow {
    id: i64,
    plan_id: i64,
    featured_by: i64,
    reason: String,
    active: bool,
    views: i64,
    featured_at: DateTime<Utc>,
    plan_title: String,
    plan_file_name: String,
    plan_view_link: String,
    teacher_name: String,
    subject_name: String,
    site_name: String,
}

impl From<FeaturedRow> for FeaturedPlanDetail {
    fn from(r: FeaturedRow) -> Self {
        FeaturedPlanDetail {
            featured: FeaturedPlan {
                id: r.id,
                plan_id: r.plan_id,
                featured_by: r.featured_by,
                reason: r.reason,
                active: r.active,
                views: r.views,
                featured_at: r.featured_at,
            },
            plan_title: r.plan_title,
            plan_file_name: r.plan_file_name,
            plan_view_link: r.plan_view_link,
            teacher_name: r.teacher_name,
            subject_name: r.subject_name,
            site_name: r.site_name,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_featured_plan(
        &self,
        featured_by: i64,
        input: &CreateFeaturedPlan,
    ) -> Result<FeaturedPlanDetail, DbError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO featured_plans (plan_id, featured_by, reason, active, views, featured_at)
             VALUES ($1, $2, $3, TRUE, 0, $4)
             RETURNING id",
        )
        .bind(input.plan_id)
        .bind(featured_by)
        .bind(input.reason.trim())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        self.pg_get_featured_plan(id).await
    }

    pub(crate) async fn pg_get_featured_plan(&self, id: i64) -> Result<FeaturedPlanDetail, DbError> {
        let row = sqlx::query_as::<_, FeaturedRow>(&format!("{DETAIL_SELECT} WHERE f.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("featured plan {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_featured_plans(
        &self,
        only_active: bool,
    ) -> Result<Vec<FeaturedPlanDetail>, DbError> {
        let filter = if only_active { " WHERE f.active" } else { "" };
        let sql = format!("{DETAIL_SELECT}{filter} ORDER BY f.featured_at DESC, f.id DESC");
        let rows = sqlx::query_as::<_, FeaturedRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_featured_plan(
        &self,
        id: i64,
        update: &UpdateFeaturedPlan,
    ) -> Result<FeaturedPlanDetail, DbError> {
        let mut set = UpdateSet::default();
        if let Some(ref reason) = update.reason {
            set.set("reason", BindValue::Str(reason.trim().to_string()));
        }
        if let Some(active) = update.active {
            set.set("active", BindValue::Bool(active));
        }
        if set.is_empty() {
            return self.pg_get_featured_plan(id).await;
        }
        if set.execute(&self.pool, "featured_plans", id).await? == 0 {
            return Err(pg_not_found(&format!("featured plan {id}")));
        }
        self.pg_get_featured_plan(id).await
    }

    pub(crate) async fn pg_increment_featured_views(
        &self,
        id: i64,
    ) -> Result<FeaturedPlanDetail, DbError> {
        let result = sqlx::query("UPDATE featured_plans SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(pg_err)?;
        if result.rows_affected() == 0 {
            return Err(pg_not_found(&format!("featured plan {id}")));
        }
        self.pg_get_featured_plan(id).await
    }

    pub(crate) async fn pg_delete_featured_plan(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "featured_plans", "featured plan", id).await
    }
}
