//! Authority roles held by club members.

use crate::{TypesError, TypesResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A member's authority role.
///
/// The set is closed. Comparisons between roles are only meaningful through
/// a rank table, so this type deliberately does not implement `Ord`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Member,
    SeniorExecutive,
    Treasurer,
    VicePresident,
    President,
    Admin,
}

impl Role {
    /// Every role, lowest authority first under the default rank table.
    pub const ALL: [Role; 6] = [
        Role::Member,
        Role::SeniorExecutive,
        Role::Treasurer,
        Role::VicePresident,
        Role::President,
        Role::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::SeniorExecutive => "senior_executive",
            Role::Treasurer => "treasurer",
            Role::VicePresident => "vice_president",
            Role::President => "president",
            Role::Admin => "admin",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Role::Member => "Member",
            Role::SeniorExecutive => "Senior Executive",
            Role::Treasurer => "Treasurer",
            Role::VicePresident => "Vice President",
            Role::President => "President",
            Role::Admin => "Administrator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TypesError;

    fn from_str(s: &str) -> TypesResult<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| TypesError::UnknownRole(s.to_string()))
    }
}
