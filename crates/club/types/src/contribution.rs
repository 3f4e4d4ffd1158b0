//! Contributions: points awarded to one member, recorded by another.

use crate::{ActivityId, ContributionId, MemberId, TypesError, TypesResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Category of a contribution.
///
/// Only used to suggest a default points value; the recorded `points` is
/// authoritative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContributionType {
    #[default]
    Participation,
    Presentation,
    Leadership,
    CompetitionWin,
    CompetitionRunnerUp,
    ProjectCompletion,
    Mentoring,
    Organizing,
}

impl ContributionType {
    pub const ALL: [ContributionType; 8] = [
        ContributionType::Participation,
        ContributionType::Presentation,
        ContributionType::Leadership,
        ContributionType::CompetitionWin,
        ContributionType::CompetitionRunnerUp,
        ContributionType::ProjectCompletion,
        ContributionType::Mentoring,
        ContributionType::Organizing,
    ];

    /// Default points offered when this type is picked
    pub fn suggested_points(&self) -> i64 {
        match self {
            ContributionType::Participation => 10,
            ContributionType::Presentation => 20,
            ContributionType::Leadership => 25,
            ContributionType::CompetitionWin => 50,
            ContributionType::CompetitionRunnerUp => 30,
            ContributionType::ProjectCompletion => 40,
            ContributionType::Mentoring => 15,
            ContributionType::Organizing => 35,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionType::Participation => "participation",
            ContributionType::Presentation => "presentation",
            ContributionType::Leadership => "leadership",
            ContributionType::CompetitionWin => "competition_win",
            ContributionType::CompetitionRunnerUp => "competition_runner_up",
            ContributionType::ProjectCompletion => "project_completion",
            ContributionType::Mentoring => "mentoring",
            ContributionType::Organizing => "organizing",
        }
    }
}

impl std::fmt::Display for ContributionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContributionType {
    type Err = TypesError;

    fn from_str(s: &str) -> TypesResult<Self> {
        ContributionType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| TypesError::UnknownContributionType(s.to_string()))
    }
}

/// A persisted contribution record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: ContributionId,
    /// Member receiving the points
    pub member_id: MemberId,
    /// Member who recorded the contribution
    pub recorded_by: MemberId,
    pub description: String,
    pub points: i64,
    pub contribution_type: ContributionType,
    pub activity_id: Option<ActivityId>,
    /// Client-generated key used to dedupe retried submissions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied payload for a new contribution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionDraft {
    pub description: String,
    pub points: i64,
    #[serde(default)]
    pub contribution_type: ContributionType,
    #[serde(default)]
    pub activity_id: Option<ActivityId>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl ContributionDraft {
    pub fn new(description: impl Into<String>, points: i64) -> Self {
        Self {
            description: description.into(),
            points,
            contribution_type: ContributionType::default(),
            activity_id: None,
            idempotency_key: None,
        }
    }

    /// Draft pre-filled with the type's suggested points
    pub fn suggested(contribution_type: ContributionType, description: impl Into<String>) -> Self {
        Self::new(description, contribution_type.suggested_points()).with_type(contribution_type)
    }

    pub fn with_type(mut self, contribution_type: ContributionType) -> Self {
        self.contribution_type = contribution_type;
        self
    }

    pub fn for_activity(mut self, activity_id: ActivityId) -> Self {
        self.activity_id = Some(activity_id);
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Partial edit of an existing contribution; `None` keeps the stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionPatch {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub contribution_type: Option<ContributionType>,
    /// `Some(None)` detaches the contribution from its activity. In JSON an
    /// absent field keeps the link and `null` clears it.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub activity_id: Option<Option<ActivityId>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl ContributionPatch {
    pub fn points(points: i64) -> Self {
        Self {
            points: Some(points),
            ..Default::default()
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn link_activity(activity_id: ActivityId) -> Self {
        Self {
            activity_id: Some(Some(activity_id)),
            ..Default::default()
        }
    }

    pub fn unlink_activity() -> Self {
        Self {
            activity_id: Some(None),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.points.is_none()
            && self.contribution_type.is_none()
            && self.activity_id.is_none()
    }
}
