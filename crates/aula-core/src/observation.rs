use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::nullable::double_option;

/// Narrative record about one student, written by one teacher for one term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    pub student_id: i64,
    pub teacher_id: i64,
    /// Term number 1..=4, taken from the active period at creation.
    pub period: i64,
    pub strengths: Option<String>,
    pub difficulties: Option<String>,
    pub commitments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateObservation {
    pub student_id: i64,
    #[serde(default)]
    pub strengths: Option<String>,
    #[serde(default)]
    pub difficulties: Option<String>,
    #[serde(default)]
    pub commitments: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateObservation {
    #[serde(default, deserialize_with = "double_option")]
    pub strengths: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub difficulties: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub commitments: Option<Option<String>>,
}
