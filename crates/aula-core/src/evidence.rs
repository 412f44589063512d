use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;
use crate::validate;
use crate::CoreError;

/// A dated, file-backed progress record on a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub evidence_date: NaiveDate,
    pub attachment: Attachment,
    pub uploaded_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEvidence {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to today when absent.
    #[serde(default)]
    pub evidence_date: Option<NaiveDate>,
}

impl CreateEvidence {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::length("title", &self.title, 5, Some(255))
    }
}
