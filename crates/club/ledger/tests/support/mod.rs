//! Shared fixtures for ledger scenario tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use club_ledger::ContributionLedger;
use club_storage::memory::InMemoryClubStorage;
use club_storage::{
    ActivityStore, ContributionRevision, ContributionStore, ContributionUpdate,
    InMemoryNotificationSink, ManualClock, MemberStore, NewContribution, NotificationSink,
    QueryWindow, StorageError, StorageResult,
};
use club_types::{
    Activity, ActivityId, Contribution, ContributionId, LevelTable, Member, MemberId,
    Notification, Participant, PointsBalance, Role,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, 18, 0, 0).unwrap()
}

/// Let detached notification tasks run.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// In-memory storage with switchable faults.
#[derive(Default)]
pub struct FaultyStorage {
    inner: InMemoryClubStorage,
    fail_increments: AtomicBool,
    hang: AtomicBool,
    write_barrier: Mutex<Option<Arc<Barrier>>>,
}

impl FaultyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_increments(&self, fail: bool) {
        self.fail_increments.store(fail, Ordering::SeqCst);
    }

    /// Every call after this never completes.
    pub fn hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    /// Contribution edits and deletes wait until `parties` of them have
    /// arrived, so every racer has finished its reads before anyone writes.
    pub fn hold_writes(&self, parties: usize) {
        *self.write_barrier.lock().unwrap() = Some(Arc::new(Barrier::new(parties)));
    }

    async fn write_gate(&self) {
        let barrier = self.write_barrier.lock().unwrap().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
    }

    async fn gate(&self) {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl MemberStore for FaultyStorage {
    async fn insert_member(&self, member: Member) -> StorageResult<Member> {
        self.gate().await;
        self.inner.insert_member(member).await
    }

    async fn get_member(&self, member_id: &MemberId) -> StorageResult<Option<Member>> {
        self.gate().await;
        self.inner.get_member(member_id).await
    }

    async fn list_members(&self) -> StorageResult<Vec<Member>> {
        self.gate().await;
        self.inner.list_members().await
    }

    async fn update_member_role(
        &self,
        member_id: &MemberId,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Member> {
        self.gate().await;
        self.inner.update_member_role(member_id, role, updated_at).await
    }

    async fn increment_member_points(
        &self,
        member_id: &MemberId,
        delta: i64,
        levels: &LevelTable,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<PointsBalance> {
        self.gate().await;
        if self.fail_increments.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("points RPC offline".to_string()));
        }
        self.inner
            .increment_member_points(member_id, delta, levels, updated_at)
            .await
    }

    async fn delete_member(&self, member_id: &MemberId) -> StorageResult<usize> {
        self.gate().await;
        self.inner.delete_member(member_id).await
    }
}

#[async_trait]
impl ContributionStore for FaultyStorage {
    async fn insert_contribution(&self, record: NewContribution) -> StorageResult<Contribution> {
        self.gate().await;
        self.inner.insert_contribution(record).await
    }

    async fn get_contribution(
        &self,
        contribution_id: &ContributionId,
    ) -> StorageResult<Option<Contribution>> {
        self.gate().await;
        self.inner.get_contribution(contribution_id).await
    }

    async fn find_contribution_by_key(&self, key: &str) -> StorageResult<Option<Contribution>> {
        self.gate().await;
        self.inner.find_contribution_by_key(key).await
    }

    async fn update_contribution(
        &self,
        contribution_id: &ContributionId,
        update: ContributionUpdate,
    ) -> StorageResult<ContributionRevision> {
        self.gate().await;
        self.write_gate().await;
        self.inner.update_contribution(contribution_id, update).await
    }

    async fn delete_contribution(
        &self,
        contribution_id: &ContributionId,
    ) -> StorageResult<Contribution> {
        self.gate().await;
        self.write_gate().await;
        self.inner.delete_contribution(contribution_id).await
    }

    async fn list_contributions(&self, window: QueryWindow) -> StorageResult<Vec<Contribution>> {
        self.gate().await;
        self.inner.list_contributions(window).await
    }

    async fn list_contributions_for_member(
        &self,
        member_id: &MemberId,
    ) -> StorageResult<Vec<Contribution>> {
        self.gate().await;
        self.inner.list_contributions_for_member(member_id).await
    }
}

#[async_trait]
impl ActivityStore for FaultyStorage {
    async fn insert_activity(&self, activity: Activity) -> StorageResult<Activity> {
        self.gate().await;
        self.inner.insert_activity(activity).await
    }

    async fn get_activity(&self, activity_id: &ActivityId) -> StorageResult<Option<Activity>> {
        self.gate().await;
        self.inner.get_activity(activity_id).await
    }

    async fn list_activities(&self) -> StorageResult<Vec<Activity>> {
        self.gate().await;
        self.inner.list_activities().await
    }

    async fn register_participant(
        &self,
        activity_id: &ActivityId,
        member_id: &MemberId,
        at: DateTime<Utc>,
    ) -> StorageResult<Participant> {
        self.gate().await;
        self.inner.register_participant(activity_id, member_id, at).await
    }

    async fn cancel_participant(
        &self,
        activity_id: &ActivityId,
        member_id: &MemberId,
        at: DateTime<Utc>,
    ) -> StorageResult<Participant> {
        self.gate().await;
        self.inner.cancel_participant(activity_id, member_id, at).await
    }

    async fn list_participants(&self, activity_id: &ActivityId) -> StorageResult<Vec<Participant>> {
        self.gate().await;
        self.inner.list_participants(activity_id).await
    }
}

/// Notification sink that never answers.
pub struct SilentSink;

#[async_trait]
impl NotificationSink for SilentSink {
    async fn notify(&self, _notification: Notification) -> StorageResult<()> {
        std::future::pending::<StorageResult<()>>().await
    }
}

pub struct Harness {
    pub ledger: ContributionLedger,
    pub storage: Arc<FaultyStorage>,
    pub sink: Arc<InMemoryNotificationSink>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        let storage = Arc::new(FaultyStorage::new());
        let sink = Arc::new(InMemoryNotificationSink::new());
        let clock = Arc::new(ManualClock::new(epoch()));
        let ledger = ContributionLedger::new(storage.clone(), sink.clone(), clock.clone());
        Self {
            ledger,
            storage,
            sink,
            clock,
        }
    }

    pub async fn member(&self, id: &str, role: Role, points: i64) -> Member {
        let levels = LevelTable::default();
        let member = Member::new(MemberId::new(id), id, &levels)
            .with_role(role)
            .with_points(points, &levels)
            .with_created_at(epoch());
        self.storage.insert_member(member).await.unwrap()
    }

    pub async fn points_of(&self, member: &Member) -> i64 {
        self.storage
            .get_member(&member.id)
            .await
            .unwrap()
            .map(|m| m.points)
            .unwrap()
    }

    pub async fn reload(&self, member: &Member) -> Member {
        self.storage.get_member(&member.id).await.unwrap().unwrap()
    }
}
