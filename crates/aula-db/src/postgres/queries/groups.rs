use chrono::{DateTime, Utc};

use aula_core::group::{CreateGroup, Group, UpdateGroup};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{bind_all_as, delete_by_id, BindValue, Filter, UpdateSet};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: i64,
    grade_id: i64,
    name: String,
    code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GroupRow> for Group {
    fn from(r: GroupRow) -> Self {
        Group {
            id: r.id,
            grade_id: r.grade_id,
            name: r.name,
            code: r.code,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_group(&self, input: &CreateGroup) -> Result<Group, DbError> {
        let row = sqlx::query_as::<_, GroupRow>(
            "INSERT INTO class_groups (grade_id, name, code, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING *",
        )
        .bind(input.grade_id)
        .bind(input.name.trim())
        .bind(&input.code)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_group(&self, id: i64) -> Result<Group, DbError> {
        let row = sqlx::query_as::<_, GroupRow>("SELECT * FROM class_groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("group {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_groups(&self, grade_id: Option<i64>) -> Result<Vec<Group>, DbError> {
        let mut f = Filter::default();
        if let Some(grade_id) = grade_id {
            f.push("grade_id = {}", BindValue::Int(grade_id));
        }
        let sql = format!("SELECT * FROM class_groups{} ORDER BY grade_id ASC, name ASC", f.sql());
        let rows = bind_all_as(sqlx::query_as::<_, GroupRow>(&sql), &f.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_group(&self, id: i64, update: &UpdateGroup) -> Result<Group, DbError> {
        let mut set = UpdateSet::default();
        if let Some(grade_id) = update.grade_id {
            set.set("grade_id", BindValue::Int(grade_id));
        }
        if let Some(ref name) = update.name {
            set.set("name", BindValue::Str(name.trim().to_string()));
        }
        if let Some(ref code) = update.code {
            set.set("code", BindValue::OptStr(code.clone()));
        }
        if set.is_empty() {
            return self.pg_get_group(id).await;
        }
        set.set("updated_at", BindValue::DateTime(Utc::now()));
        if set.execute(&self.pool, "class_groups", id).await? == 0 {
            return Err(pg_not_found(&format!("group {id}")));
        }
        self.pg_get_group(id).await
    }

    pub(crate) async fn pg_delete_group(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "class_groups", "group", id).await
    }

    pub(crate) async fn pg_assign_group_director(
        &self,
        group_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO group_directors (teacher_id, group_id, created_at)
             VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING",
        )
        .bind(teacher_id)
        .bind(group_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(())
    }

    pub(crate) async fn pg_unassign_group_director(
        &self,
        group_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError> {
        let result =
            sqlx::query("DELETE FROM group_directors WHERE teacher_id = $1 AND group_id = $2")
                .bind(teacher_id)
                .bind(group_id)
                .execute(&self.pool)
                .await
                .map_err(pg_err)?;
        if result.rows_affected() == 0 {
            return Err(pg_not_found(&format!(
                "teacher {teacher_id} does not direct group {group_id}"
            )));
        }
        Ok(())
    }

    pub(crate) async fn pg_is_group_director(
        &self,
        group_id: i64,
        teacher_id: i64,
    ) -> Result<bool, DbError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM group_directors WHERE teacher_id = $1 AND group_id = $2)",
        )
        .bind(teacher_id)
        .bind(group_id)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)
    }
}
