use chrono::{DateTime, NaiveDate, Utc};

use aula_core::attachment::Attachment;
use aula_core::evidence::{CreateEvidence, Evidence};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use super::{delete_by_id, AttachmentColumns};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct EvidenceRow {
    id: i64,
    project_id: i64,
    title: String,
    description: Option<String>,
    evidence_date: NaiveDate,
    #[sqlx(flatten)]
    attachment: AttachmentColumns,
    uploaded_by: i64,
    created_at: DateTime<Utc>,
}

impl From<EvidenceRow> for Evidence {
    fn from(r: EvidenceRow) -> Self {
        Evidence {
            id: r.id,
            project_id: r.project_id,
            title: r.title,
            description: r.description,
            evidence_date: r.evidence_date,
            attachment: r.attachment.into_required(),
            uploaded_by: r.uploaded_by,
            created_at: r.created_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_evidence(
        &self,
        project_id: i64,
        uploaded_by: i64,
        input: &CreateEvidence,
        attachment: &Attachment,
    ) -> Result<Evidence, DbError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, EvidenceRow>(
            "INSERT INTO evidence (project_id, title, description, evidence_date,
                                   remote_id, file_name, file_type, size_bytes,
                                   view_link, embed_link, download_link,
                                   uploaded_by, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING *",
        )
        .bind(project_id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.evidence_date.unwrap_or_else(|| now.date_naive()))
        .bind(&attachment.remote_id)
        .bind(&attachment.file_name)
        .bind(attachment.file_type.as_str())
        .bind(attachment.size_bytes)
        .bind(&attachment.view_link)
        .bind(&attachment.embed_link)
        .bind(&attachment.download_link)
        .bind(uploaded_by)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_evidence(&self, id: i64) -> Result<Evidence, DbError> {
        let row = sqlx::query_as::<_, EvidenceRow>("SELECT * FROM evidence WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("evidence {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_evidence(&self, project_id: i64) -> Result<Vec<Evidence>, DbError> {
        let rows = sqlx::query_as::<_, EvidenceRow>(
            "SELECT * FROM evidence WHERE project_id = $1 ORDER BY evidence_date DESC, id DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_delete_evidence(&self, id: i64) -> Result<(), DbError> {
        delete_by_id(&self.pool, "evidence", "evidence", id).await
    }
}
