use std::fmt;

use serde::{Deserialize, Serialize};

/// Institutional role. Wire values keep the school's own names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "docente")]
    Teacher,
    #[serde(rename = "coordinador")]
    Coordinator,
    #[serde(rename = "rector")]
    Principal,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => "docente",
            Role::Coordinator => "coordinador",
            Role::Principal => "rector",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Teacher => "Teacher",
            Role::Coordinator => "Coordinator",
            Role::Principal => "Principal",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "docente" => Some(Role::Teacher),
            "coordinador" => Some(Role::Coordinator),
            "rector" => Some(Role::Principal),
            _ => None,
        }
    }

    /// Coordinators and principals administer the institution.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Coordinator | Role::Principal)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
