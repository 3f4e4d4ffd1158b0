//! Member profiles
//!
//! A profile is created on first successful authentication and carries the
//! member's role and points balance. `level` is always the value the active
//! [`LevelTable`] yields for `points`.

use crate::{Level, LevelTable, MemberId, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A club member profile
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    /// Unique, non-empty handle
    pub username: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub points: i64,
    pub level: Level,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// A fresh profile: role `member`, zero points, base level.
    pub fn new(id: MemberId, username: impl Into<String>, levels: &LevelTable) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: username.into(),
            full_name: None,
            role: Role::Member,
            points: 0,
            level: levels.level_of(0),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set the points balance and the matching level together.
    pub fn with_points(mut self, points: i64, levels: &LevelTable) -> Self {
        self.points = points;
        self.level = levels.level_of(points);
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }

    /// Name to show in notifications and listings
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

/// A member's points balance right after a mutation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsBalance {
    pub member_id: MemberId,
    pub points: i64,
    pub level: Level,
}
