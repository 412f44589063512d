use chrono::{DateTime, Utc};

use aula_core::subject::{CreateSubject, Subject, SubjectFilter, UpdateSubject};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{bind_all_as, delete_by_id, BindValue, Filter, UpdateSet};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct SubjectRow {
    id: i64,
    name: String,
    area_id: i64,
    code: Option<String>,
    description: Option<String>,
    grades: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SubjectRow> for Subject {
    fn from(r: SubjectRow) -> Self {
        Subject {
            id: r.id,
            name: r.name,
            area_id: r.area_id,
            code: r.code,
            description: r.description,
            grades: r.grades,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_subject(&self, input: &CreateSubject) -> Result<Subject, DbError> {
        let row = sqlx::query_as::<_, SubjectRow>(
            "INSERT INTO subjects (name, area_id, code, description, grades, active,
                                   created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING *",
        )
        .bind(input.name.trim())
        .bind(input.area_id)
        .bind(&input.code)
        .bind(&input.description)
        .bind(&input.grades)
        .bind(input.active)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_subject(&self, id: i64) -> Result<Subject, DbError> {
        let row = sqlx::query_as::<_, SubjectRow>("SELECT * FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("subject {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_subjects(
        &self,
        filter: &SubjectFilter,
    ) -> Result<Vec<Subject>, DbError> {
        let mut f = Filter::default();
        if let Some(area_id) = filter.area_id {
            f.push("area_id = {}", BindValue::Int(area_id));
        }
        if let Some(active) = filter.active {
            f.push("active = {}", BindValue::Bool(active));
        }
        if let Some(teacher_id) = filter.teacher_id {
            f.push(
                "id IN (SELECT subject_id FROM teacher_subjects WHERE teacher_id = {})",
                BindValue::Int(teacher_id),
            );
        }
        let sql = format!("SELECT * FROM subjects{} ORDER BY name ASC, id ASC", f.sql());
        let rows = bind_all_as(sqlx::query_as::<_, SubjectRow>(&sql), &f.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_subject(
        &self,
        id: i64,
        update: &UpdateSubject,
    ) -> Result<Subject, DbError> {
        let mut set = UpdateSet::default();
        if let Some(ref name) = update.name {
            set.set("name", BindValue::Str(name.trim().to_string()));
        }
        if let Some(area_id) = update.area_id {
            set.set("area_id", BindValue::Int(area_id));
        }
        if let Some(ref code) = update.code {
            set.set("code", BindValue::OptStr(code.clone()));
        }
        if let Some(ref description) = update.description {
            set.set("description", BindValue::OptStr(description.clone()));
        }
        if let Some(ref grades) = update.grades {
            set.set("grades", BindValue::OptStr(grades.clone()));
        }
        if let Some(active) = update.active {
            set.set("active", BindValue::Bool(active));
        }
        if set.is_empty() {
            return self.pg_get_subject(id).await;
        }
        set.set("updated_at", BindValue::DateTime(Utc::now()));
        if set.execute(&self.pool, "subjects", id).await? == 0 {
            return Err(pg_not_found(&format!("subject {id}")));
        }
        self.pg_get_subject(id).await
    }

    pub(crate) async fn pg_delete_subject(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "subjects", "subject", id).await
    }

    pub(crate) async fn pg_assign_subject_teacher(
        &self,
        subject_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO teacher_subjects (teacher_id, subject_id, created_at)
             VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING",
        )
        .bind(teacher_id)
        .bind(subject_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(())
    }

    pub(crate) async fn pg_unassign_subject_teacher(
        &self,
        subject_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError> {
        let result =
            sqlx::query("DELETE FROM teacher_subjects WHERE teacher_id = $1 AND subject_id = $2")
                .bind(teacher_id)
                .bind(subject_id)
                .execute(&self.pool)
                .await
                .map_err(pg_err)?;
        if result.rows_affected() == 0 {
            return Err(pg_not_found(&format!(
                "teacher {teacher_id} is not assigned to subject {subject_id}"
            )));
        }
        Ok(())
    }
}
