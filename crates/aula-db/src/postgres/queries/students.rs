use chrono::{DateTime, Utc};

use aula_core::student::{CreateStudent, Student, UpdateStudent};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{bind_all_as, delete_by_id, BindValue, Filter, UpdateSet};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct StudentRow {
    id: i64,
    group_id: i64,
    document_number: String,
    first_names: String,
    last_names: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StudentRow> for Student {
    fn from(r: StudentRow) -> Self {
        Student {
            id: r.id,
            group_id: r.group_id,
            document_number: r.document_number,
            first_names: r.first_names,
            last_names: r.last_names,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_student(&self, input: &CreateStudent) -> Result<Student, DbError> {
        let row = sqlx::query_as::<_, StudentRow>(
            "INSERT INTO students (group_id, document_number, first_names, last_names,
                                   created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING *",
        )
        .bind(input.group_id)
        .bind(input.document_number.trim())
        .bind(input.first_names.trim())
        .bind(input.last_names.trim())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_student(&self, id: i64) -> Result<Student, DbError> {
        let row = sqlx::query_as::<_, StudentRow>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("student {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_students(
        &self,
        group_id: Option<i64>,
    ) -> Result<Vec<Student>, DbError> {
        let mut f = Filter::default();
        if let Some(group_id) = group_id {
            f.push("group_id = {}", BindValue::Int(group_id));
        }
        let sql = format!(
            "SELECT * FROM students{} ORDER BY last_names ASC, first_names ASC, id ASC",
            f.sql()
        );
        let rows = bind_all_as(sqlx::query_as::<_, StudentRow>(&sql), &f.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_update_student(
        &self,
        id: i64,
        update: &UpdateStudent,
    ) -> Result<Student, DbError> {
        let mut set = UpdateSet::default();
        if let Some(group_id) = update.group_id {
            set.set("group_id", BindValue::Int(group_id));
        }
        if let Some(ref document_number) = update.document_number {
            set.set("document_number", BindValue::Str(document_number.trim().to_string()));
        }
        if let Some(ref first_names) = update.first_names {
            set.set("first_names", BindValue::Str(first_names.trim().to_string()));
        }
        if let Some(ref last_names) = update.last_names {
            set.set("last_names", BindValue::Str(last_names.trim().to_string()));
        }
        if set.is_empty() {
            return self.pg_get_student(id).await;
        }
        set.set("updated_at", BindValue::DateTime(Utc::now()));
        if set.execute(&self.pool, "students", id).await? == 0 {
            return Err(pg_not_found(&format!("student {id}")));
        }
        self.pg_get_student(id).await
    }

    pub(crate) async fn pg_delete_student(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "students", "student", id).await
    }
}
