use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;
use crate::nullable::double_option;
use crate::validate;
use crate::CoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "Active",
            ProjectStatus::Paused => "Paused",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProjectStatus::Active),
            "paused" => Some(ProjectStatus::Paused),
            "completed" => Some(ProjectStatus::Completed),
            "cancelled" => Some(ProjectStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s).ok_or_else(|| format!("unknown project status '{s}'"))
    }
}

/// A longer-running pedagogical initiative owned by one teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub teacher_id: i64,
    pub title: String,
    pub description: String,
    pub objectives: Option<String>,
    pub starts_on: NaiveDate,
    pub estimated_end: Option<NaiveDate>,
    pub attachment: Option<Attachment>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub objectives: Option<String>,
    pub starts_on: NaiveDate,
    #[serde(default)]
    pub estimated_end: Option<NaiveDate>,
}

impl CreateProject {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::length("title", &self.title, 5, Some(255))?;
        validate::length("description", &self.description, 20, None)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub objectives: Option<Option<String>>,
    pub starts_on: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub estimated_end: Option<Option<NaiveDate>>,
    pub status: Option<ProjectStatus>,
}

impl UpdateProject {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::length_opt("title", self.title.as_deref(), 5, Some(255))?;
        validate::length_opt("description", self.description.as_deref(), 20, None)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFilter {
    pub teacher_id: Option<i64>,
    pub status: Option<ProjectStatus>,
}
