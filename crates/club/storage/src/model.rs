use chrono::{DateTime, Utc};
use club_types::{ActivityId, Contribution, ContributionType, MemberId};
use serde::{Deserialize, Serialize};

/// Insert payload for a contribution. Ids are assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContribution {
    pub member_id: MemberId,
    pub recorded_by: MemberId,
    pub description: String,
    pub points: i64,
    pub contribution_type: ContributionType,
    pub activity_id: Option<ActivityId>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fully-resolved replacement values for an edited contribution.
///
/// `member_id`, `recorded_by` and `created_at` are immutable and therefore
/// absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionUpdate {
    pub description: String,
    pub points: i64,
    pub contribution_type: ContributionType,
    pub activity_id: Option<ActivityId>,
    pub updated_at: DateTime<Utc>,
}

/// Result of an edit, taken in the same critical section as the write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRevision {
    /// Points the record held immediately before this edit
    pub previous_points: i64,
    pub contribution: Contribution,
}

impl ContributionRevision {
    /// Points change to apply to the target member.
    pub fn delta(&self) -> i64 {
        self.contribution.points - self.previous_points
    }
}
