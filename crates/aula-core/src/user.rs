use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::nullable::double_option;
use crate::role::Role;
use crate::validate;
use crate::CoreError;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 8;

fn check_email(email: &str) -> Result<(), CoreError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(CoreError::InvalidInput(format!("'{email}' is not an email address"))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    /// National identity number; doubles as the login name.
    pub national_id: String,
    pub role: Role,
    pub active: bool,
    pub phone: Option<String>,
    pub site_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub full_name: String,
    pub national_id: String,
    pub password: String,
    pub role: Role,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub site_id: Option<i64>,
}

impl CreateUser {
    pub fn validate(&self) -> Result<(), CoreError> {
        check_email(&self.email)?;
        validate::length("full_name", &self.full_name, 3, Some(150))?;
        validate::length("national_id", &self.national_id, 5, Some(20))?;
        validate::length("password", &self.password, MIN_PASSWORD_LEN, None)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub site_id: Option<Option<i64>>,
    /// Plain text; hashed by the service before it reaches storage.
    pub password: Option<String>,
}

impl UpdateUser {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(ref email) = self.email {
            check_email(email)?;
        }
        validate::length_opt("full_name", self.full_name.as_deref(), 3, Some(150))?;
        validate::length_opt("password", self.password.as_deref(), MIN_PASSWORD_LEN, None)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub active: Option<bool>,
}
