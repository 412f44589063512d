use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a project comment is about. Exactly one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CommentTarget {
    Project(i64),
    Evidence(i64),
}

impl CommentTarget {
    pub fn project_id(&self) -> Option<i64> {
        match self {
            CommentTarget::Project(id) => Some(*id),
            CommentTarget::Evidence(_) => None,
        }
    }

    pub fn evidence_id(&self) -> Option<i64> {
        match self {
            CommentTarget::Evidence(id) => Some(*id),
            CommentTarget::Project(_) => None,
        }
    }

    /// Rebuild from the two nullable storage columns.
    pub fn from_columns(project_id: Option<i64>, evidence_id: Option<i64>) -> Option<Self> {
        match (project_id, evidence_id) {
            (Some(p), None) => Some(CommentTarget::Project(p)),
            (None, Some(e)) => Some(CommentTarget::Evidence(e)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectComment {
    pub id: i64,
    pub target: CommentTarget,
    pub author_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectComment {
    /// Comment on this evidence instead of the project itself.
    #[serde(default)]
    pub evidence_id: Option<i64>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProjectComment {
    pub content: String,
}
