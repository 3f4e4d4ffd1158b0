use crate::model::{ContributionRevision, ContributionUpdate, NewContribution};
use crate::StorageResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use club_types::{
    Activity, ActivityId, Contribution, ContributionId, LevelTable, Member, MemberId,
    Participant, PointsBalance, Role,
};

/// Generic query window for paged reads. `limit == 0` means unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

impl QueryWindow {
    pub fn all() -> Self {
        Self::default()
    }
}

/// Storage interface for member profiles.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Insert a new profile. Fails with `Conflict` on a duplicate id or username.
    async fn insert_member(&self, member: Member) -> StorageResult<Member>;

    async fn get_member(&self, member_id: &MemberId) -> StorageResult<Option<Member>>;

    /// All profiles, highest points first.
    async fn list_members(&self) -> StorageResult<Vec<Member>>;

    async fn update_member_role(
        &self,
        member_id: &MemberId,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Member>;

    /// Atomically add `delta` to the member's points and store the level
    /// `levels` yields for the new balance. A resulting balance below zero is
    /// rejected with `InvariantViolation` and leaves the member untouched.
    async fn increment_member_points(
        &self,
        member_id: &MemberId,
        delta: i64,
        levels: &LevelTable,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<PointsBalance>;

    /// Remove a profile together with its contributions and registrations.
    /// Returns the number of contributions removed.
    async fn delete_member(&self, member_id: &MemberId) -> StorageResult<usize>;
}

/// Storage interface for contribution records.
#[async_trait]
pub trait ContributionStore: Send + Sync {
    /// Persist a contribution. Fails with `Conflict` when the idempotency key
    /// is already taken.
    async fn insert_contribution(&self, record: NewContribution) -> StorageResult<Contribution>;

    async fn get_contribution(
        &self,
        contribution_id: &ContributionId,
    ) -> StorageResult<Option<Contribution>>;

    async fn find_contribution_by_key(&self, key: &str) -> StorageResult<Option<Contribution>>;

    /// Replace the editable fields and report the points the record held
    /// just before the write. Callers derive point deltas from this value,
    /// never from an earlier read.
    async fn update_contribution(
        &self,
        contribution_id: &ContributionId,
        update: ContributionUpdate,
    ) -> StorageResult<ContributionRevision>;

    /// Remove a contribution, returning the record as it was when removed.
    async fn delete_contribution(
        &self,
        contribution_id: &ContributionId,
    ) -> StorageResult<Contribution>;

    /// Contributions newest-first.
    async fn list_contributions(&self, window: QueryWindow) -> StorageResult<Vec<Contribution>>;

    async fn list_contributions_for_member(
        &self,
        member_id: &MemberId,
    ) -> StorageResult<Vec<Contribution>>;
}

/// Storage interface for activities and registrations.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn insert_activity(&self, activity: Activity) -> StorageResult<Activity>;

    async fn get_activity(&self, activity_id: &ActivityId) -> StorageResult<Option<Activity>>;

    /// Activities, latest date first.
    async fn list_activities(&self) -> StorageResult<Vec<Activity>>;

    /// Register a member, enforcing the activity's capacity in the same
    /// critical section. Re-registering is a no-op that returns the existing
    /// registration. Fails with `CapacityExceeded` when full.
    async fn register_participant(
        &self,
        activity_id: &ActivityId,
        member_id: &MemberId,
        at: DateTime<Utc>,
    ) -> StorageResult<Participant>;

    async fn cancel_participant(
        &self,
        activity_id: &ActivityId,
        member_id: &MemberId,
        at: DateTime<Utc>,
    ) -> StorageResult<Participant>;

    async fn list_participants(&self, activity_id: &ActivityId) -> StorageResult<Vec<Participant>>;
}

/// Unified storage bundle used by the ledger and services.
pub trait ClubStorage: MemberStore + ContributionStore + ActivityStore + Send + Sync {}

impl<T> ClubStorage for T where T: MemberStore + ContributionStore + ActivityStore + Send + Sync {}
