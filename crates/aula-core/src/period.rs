use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::nullable::double_option;

/// One of the four academic terms. At most one is active at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub id: i64,
    /// "1" through "4".
    pub name: String,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Period {
    /// The term number encoded in the name, if it is one of 1..=4.
    pub fn number(&self) -> Option<i64> {
        self.name
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|n| (1..=4).contains(n))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePeriod {
    #[serde(default, deserialize_with = "double_option")]
    pub starts_on: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub ends_on: Option<Option<NaiveDate>>,
    pub active: Option<bool>,
}

/// What happens when a period is activated while another one is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeriodActivationPolicy {
    /// Every other period is switched off in the same transaction.
    #[default]
    AutoDeactivate,
    /// Activation is refused while another period is active.
    ExclusiveLock,
}

impl PeriodActivationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodActivationPolicy::AutoDeactivate => "auto-deactivate",
            PeriodActivationPolicy::ExclusiveLock => "exclusive-lock",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "auto-deactivate" => Some(PeriodActivationPolicy::AutoDeactivate),
            "exclusive-lock" => Some(PeriodActivationPolicy::ExclusiveLock),
            _ => None,
        }
    }
}

impl fmt::Display for PeriodActivationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PeriodActivationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s).ok_or_else(|| {
            format!("unknown period policy '{s}' (expected auto-deactivate or exclusive-lock)")
        })
    }
}
