use crate::MemberId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message addressed to one member
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub member_id: MemberId,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        member_id: MemberId,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            member_id,
            title: title.into(),
            message: message.into(),
            created_at,
        }
    }
}
