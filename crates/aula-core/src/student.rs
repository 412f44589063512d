use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validate;
use crate::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub group_id: i64,
    pub document_number: String,
    pub first_names: String,
    pub last_names: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudent {
    pub group_id: i64,
    pub document_number: String,
    pub first_names: String,
    pub last_names: String,
}

impl CreateStudent {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::length("document_number", &self.document_number, 5, Some(20))?;
        validate::length("first_names", &self.first_names, 2, Some(150))?;
        validate::length("last_names", &self.last_names, 2, Some(150))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStudent {
    pub group_id: Option<i64>,
    pub document_number: Option<String>,
    pub first_names: Option<String>,
    pub last_names: Option<String>,
}

impl UpdateStudent {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::length_opt("document_number", self.document_number.as_deref(), 5, Some(20))?;
        validate::length_opt("first_names", self.first_names.as_deref(), 2, Some(150))?;
        validate::length_opt("last_names", self.last_names.as_deref(), 2, Some(150))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(doc: &str) -> CreateStudent {
        CreateStudent {
            group_id: 1,
            document_number: doc.into(),
            first_names: "Ana".into(),
            last_names: "Pérez".into(),
        }
    }

    #[test]
    fn document_number_bounds() {
        assert!(student("1234").validate().is_err());
        assert!(student("12345").validate().is_ok());
        assert!(student(&"9".repeat(20)).validate().is_ok());
        assert!(student(&"9".repeat(21)).validate().is_err());
    }

    #[test]
    fn update_only_checks_present_fields() {
        assert!(UpdateStudent::default().validate().is_ok());
        let short = UpdateStudent {
            first_names: Some("A".into()),
            ..Default::default()
        };
        assert!(short.validate().is_err());
    }
}
