use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validate;
use crate::CoreError;

/// Feedback left by a coordinator or principal on a lesson plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanComment {
    pub id: i64,
    pub plan_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlanComment {
    pub plan_id: i64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePlanComment {
    pub content: String,
}

pub fn validate_content(content: &str) -> Result<(), CoreError> {
    validate::length("content", content, 10, None)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanCommentFilter {
    pub plan_id: Option<i64>,
    pub author_id: Option<i64>,
    /// Restrict to comments on plans owned by this teacher.
    pub plan_teacher_id: Option<i64>,
}
