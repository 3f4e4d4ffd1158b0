//! Scheduled activities and their participants.

use crate::{ActivityId, MemberId, TypesError, TypesResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of scheduled activity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[default]
    Workshop,
    Competition,
    Session,
    Meeting,
}

impl ActivityType {
    pub const ALL: [ActivityType; 4] = [
        ActivityType::Workshop,
        ActivityType::Competition,
        ActivityType::Session,
        ActivityType::Meeting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Workshop => "workshop",
            ActivityType::Competition => "competition",
            ActivityType::Session => "session",
            ActivityType::Meeting => "meeting",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = TypesError;

    fn from_str(s: &str) -> TypesResult<Self> {
        ActivityType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| TypesError::UnknownActivityType(s.to_string()))
    }
}

/// A scheduled club event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub activity_type: ActivityType,
    /// `None` means unlimited
    pub max_participants: Option<u32>,
    pub created_by: MemberId,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied payload for a new activity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub activity_type: ActivityType,
    #[serde(default)]
    pub max_participants: Option<u32>,
}

impl ActivityDraft {
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: None,
            date,
            activity_type: ActivityType::default(),
            max_participants: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_type(mut self, activity_type: ActivityType) -> Self {
        self.activity_type = activity_type;
        self
    }

    pub fn with_capacity(mut self, max_participants: u32) -> Self {
        self.max_participants = Some(max_participants);
        self
    }
}

/// Registration state of a participant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Registered,
    Cancelled,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Registered => "registered",
            ParticipantStatus::Cancelled => "cancelled",
        }
    }
}

/// A member's registration for an activity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub activity_id: ActivityId,
    pub member_id: MemberId,
    pub status: ParticipantStatus,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    pub fn is_registered(&self) -> bool {
        self.status == ParticipantStatus::Registered
    }
}
