use chrono::{DateTime, Utc};

use aula_core::grade::{CreateGrade, Grade, UpdateGrade};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{bind_all_as, delete_by_id, BindValue, Filter, UpdateSet};
use crate::DbError;

const GRADE_SELECT: &str = "SELECT g.*,
        (SELECT COUNT(*) FROM class_groups cg WHERE cg.grade_id = g.id) AS group_count
     FROM grades g";

#[derive(sqlx::FromRow)]
struct GradeRow {
    id: i64,
    site_id: i64,
    name: String,
    code: Option<String>,
    group_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GradeRow> for Grade {
    fn from(r: GradeRow) -> Self {
        Grade {
            id: r.id,
            site_id: r.site_id,
            name: r.name,
            code: r.code,
            group_count: r.group_count,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_grade(&self, input: &CreateGrade) -> Result<Grade, DbError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO grades (site_id, name, code, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING id",
        )
        .bind(input.site_id)
        .bind(input.name.trim())
        .bind(&input.code)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        self.pg_get_grade(id).await
    }

    pub(crate) async fn pg_get_grade(&self, id: i64) -> Result<Grade, DbError> {
        let row = sqlx::query_as::<_, GradeRow>(&format!("{GRADE_SELECT} WHERE g.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("grade {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_grades(&self, site_id: Option<i64>) -> Result<Vec<Grade>, DbError> {
        let mut f = Filter::default();
        if let Some(site_id) = site_id {
            f.push("g.site_id = {}", BindValue::Int(site_id));
        }
        let sql = format!("{GRADE_SELECT}{} ORDER BY g.site_id ASC, g.name ASC", f.sql());
        let rows = bind_all_as(sqlx::query_as::<_, GradeRow>(&sql), &f.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_grade(&self, id: i64, update: &UpdateGrade) -> Result<Grade, DbError> {
        let mut set = UpdateSet::default();
        if let Some(site_id) = update.site_id {
            set.set("site_id", BindValue::Int(site_id));
        }
        if let Some(ref name) = update.name {
            set.set("name", BindValue::Str(name.trim().to_string()));
        }
        if let Some(ref code) = update.code {
            set.set("code", BindValue::OptStr(code.clone()));
        }
        if set.is_empty() {
            return self.pg_get_grade(id).await;
        }
        set.set("updated_at", BindValue::DateTime(Utc::now()));
        if set.execute(&self.pool, "grades", id).await? == 0 {
            return Err(pg_not_found(&format!("grade {id}")));
        }
        self.pg_get_grade(id).await
    }

    pub(crate) async fn pg_delete_grade(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "grades", "grade", id).await
    }
}
