use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validate;
use crate::CoreError;

/// A lesson plan recognised as an institutional exemplar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturedPlan {
    pub id: i64,
    pub plan_id: i64,
    pub featured_by: i64,
    pub reason: String,
    pub active: bool,
    pub views: i64,
    pub featured_at: DateTime<Utc>,
}

/// Featured entry joined with the plan, teacher, subject and site it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturedPlanDetail {
    #[serde(flatten)]
    pub featured: FeaturedPlan,
    pub plan_title: String,
    pub plan_file_name: String,
    pub plan_view_link: String,
    pub teacher_name: String,
    pub subject_name: String,
    pub site_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeaturedPlan {
    pub plan_id: i64,
    pub reason: String,
}

impl CreateFeaturedPlan {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::length("reason", &self.reason, 20, None)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFeaturedPlan {
    pub reason: Option<String>,
    pub active: Option<bool>,
}

impl UpdateFeaturedPlan {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::length_opt("reason", self.reason.as_deref(), 20, None)
    }
}
