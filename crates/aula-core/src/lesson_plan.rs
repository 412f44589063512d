use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;
use crate::validate;
use crate::CoreError;

/// A teacher-submitted planning document for one subject and period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonPlan {
    pub id: i64,
    pub teacher_id: i64,
    pub subject_id: i64,
    pub site_id: i64,
    pub period_id: i64,
    pub title: String,
    pub attachment: Attachment,
    pub uploaded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row data for a new plan; every id is resolved by the caller.
#[derive(Debug, Clone)]
pub struct NewLessonPlan {
    pub teacher_id: i64,
    pub subject_id: i64,
    pub site_id: i64,
    pub period_id: i64,
    pub title: String,
    pub attachment: Attachment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLessonPlan {
    pub subject_id: i64,
    pub title: String,
}

impl CreateLessonPlan {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::length("title", &self.title, 5, Some(255))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLessonPlan {
    pub title: Option<String>,
    pub subject_id: Option<i64>,
    pub period_id: Option<i64>,
}

impl UpdateLessonPlan {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::length_opt("title", self.title.as_deref(), 5, Some(255))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LessonPlanFilter {
    pub teacher_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub site_id: Option<i64>,
    pub period_id: Option<i64>,
}
