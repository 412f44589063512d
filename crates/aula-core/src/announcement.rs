use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;
use crate::validate;
use crate::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnnouncement {
    pub title: String,
    pub content: String,
}

impl CreateAnnouncement {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::length("title", &self.title, 5, Some(255))?;
        validate::length("content", &self.content, 10, None)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAnnouncement {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl UpdateAnnouncement {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::length_opt("title", self.title.as_deref(), 5, Some(255))?;
        validate::length_opt("content", self.content.as_deref(), 10, None)
    }
}
