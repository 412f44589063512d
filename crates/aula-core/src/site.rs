use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::nullable::double_option;

/// A physical campus of the institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSite {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSite {
    pub name: Option<String>,
    pub code: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    pub active: Option<bool>,
}
