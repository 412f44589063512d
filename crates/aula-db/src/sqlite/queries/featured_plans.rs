use chrono::Utc;
use rusqlite::{params, Connection, Row, ToSql};

use aula_core::featured_plan::{
    CreateFeaturedPlan, FeaturedPlan, FeaturedPlanDetail, UpdateFeaturedPlan,
};

use super::super::{SqliteDatabase, SqliteResultExt};
use super::{execute_update, query_all, NotFoundExt};
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

fn row_to_detail(row: &Row) -> rusqlite::Result<FeaturedPlanDetail> {
    Ok(FeaturedPlanDetail {
        featured: FeaturedPlan {
            id: row.get("id")?,
            plan_id: row.get("plan_id")?,
            featured_by: row.get("featured_by")?,
            reason: row.get("reason")?,
            active: row.get("active")?,
            views: row.get("views")?,
            featured_at: row.get("featured_at")?,
        },
        plan_title: row.get("plan_title")?,
        plan_file_name: row.get("plan_file_name")?,
        plan_view_link: row.get("plan_view_link")?,
        teacher_name: row.get("teacher_name")?,
        subject_name: row.get("subject_name")?,
        site_name: row.get("site_name")?,
    })
}

fn select_detail(conn: &Connection, id: i64) -> Result<FeaturedPlanDetail, DbError> {
    conn.query_row(
        &format!("{DETAIL_SELECT} WHERE f.id = ?1"),
        params![id],
        row_to_detail,
    )
    .or_not_found(|| format!("featured plan {id}"))
}

impl SqliteDatabase {
    pub fn create_featured_plan_sync(
        &self,
        featured_by: i64,
        input: &CreateFeaturedPlan,
    ) -> Result<FeaturedPlanDetail, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO featured_plans (plan_id, featured_by, reason, active, views, featured_at)
                 VALUES (?1, ?2, ?3, 1, 0, ?4)",
                params![input.plan_id, featured_by, input.reason.trim(), Utc::now()],
            )
            .to_db()?;
            select_detail(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_featured_plan_sync(&self, id: i64) -> Result<FeaturedPlanDetail, DbError> {
        self.with_conn(|conn| select_detail(conn, id))
    }

    pub fn list_featured_plans_sync(
        &self,
        only_active: bool,
    ) -> Result<Vec<FeaturedPlanDetail>, DbError> {
        self.with_conn(|conn| {
            let filter = if only_active { " WHERE f.active = 1" } else { "" };
            let sql = format!("{DETAIL_SELECT}{filter} ORDER BY f.featured_at DESC, f.id DESC");
            query_all(conn, &sql, &[], row_to_detail)
        })
    }

    pub fn update_featured_plan_sync(
        &self,
        id: i64,
        update: &UpdateFeaturedPlan,
    ) -> Result<FeaturedPlanDetail, DbError> {
        self.with_conn(|conn| {
            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();
            if let Some(ref reason) = update.reason {
                sets.push("reason = ?");
                values.push(Box::new(reason.trim().to_string()));
            }
            if let Some(active) = update.active {
                sets.push("active = ?");
                values.push(Box::new(active));
            }
            if sets.is_empty() {
                return select_detail(conn, id);
            }
            if execute_update(conn, "featured_plans", id, &sets, values)? == 0 {
                return Err(DbError::NotFound(format!("featured plan {id}")));
            }
            select_detail(conn, id)
        })
    }

    pub fn increment_featured_views_sync(&self, id: i64) -> Result<FeaturedPlanDetail, DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE featured_plans SET views = views + 1 WHERE id = ?1",
                    params![id],
                )
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("featured plan {id}")));
            }
            select_detail(conn, id)
        })
    }

    pub fn delete_featured_plan_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM featured_plans WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("featured plan {id}")));
            }
            Ok(())
        })
    }
}
