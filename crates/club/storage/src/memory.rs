//! In-memory reference implementation of the club storage traits.
//!
//! This adapter is deterministic and test-friendly. Every points increment
//! runs under the members write lock, so concurrent increments serialize.
//! Locks are always taken in the order members, contributions, activities,
//! participants.

use crate::model::{ContributionRevision, ContributionUpdate, NewContribution};
use crate::traits::{ActivityStore, ContributionStore, MemberStore, QueryWindow};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use club_types::{
    Activity, ActivityId, Contribution, ContributionId, LevelTable, Member, MemberId,
    Participant, ParticipantStatus, PointsBalance, Role,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory club storage adapter.
#[derive(Default)]
pub struct InMemoryClubStorage {
    members: RwLock<HashMap<MemberId, Member>>,
    contributions: RwLock<HashMap<ContributionId, Contribution>>,
    activities: RwLock<HashMap<ActivityId, Activity>>,
    participants: RwLock<HashMap<(ActivityId, MemberId), Participant>>,
}

impl InMemoryClubStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(what: &str) -> StorageError {
    StorageError::Backend(format!("{what} lock poisoned"))
}

#[async_trait]
impl MemberStore for InMemoryClubStorage {
    async fn insert_member(&self, member: Member) -> StorageResult<Member> {
        if member.username.trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "username must not be empty".to_string(),
            ));
        }

        let mut guard = self.members.write().map_err(|_| poisoned("members"))?;
        if guard.contains_key(&member.id) {
            return Err(StorageError::Conflict(format!(
                "member {} already exists",
                member.id
            )));
        }
        if guard.values().any(|m| m.username == member.username) {
            return Err(StorageError::Conflict(format!(
                "username {} is taken",
                member.username
            )));
        }

        guard.insert(member.id.clone(), member.clone());
        Ok(member)
    }

    async fn get_member(&self, member_id: &MemberId) -> StorageResult<Option<Member>> {
        let guard = self.members.read().map_err(|_| poisoned("members"))?;
        Ok(guard.get(member_id).cloned())
    }

    async fn list_members(&self) -> StorageResult<Vec<Member>> {
        let guard = self.members.read().map_err(|_| poisoned("members"))?;
        let mut values = guard.values().cloned().collect::<Vec<_>>();
        values.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(values)
    }

    async fn update_member_role(
        &self,
        member_id: &MemberId,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Member> {
        let mut guard = self.members.write().map_err(|_| poisoned("members"))?;
        let member = guard
            .get_mut(member_id)
            .ok_or_else(|| StorageError::NotFound(format!("member {member_id} not found")))?;
        member.role = role;
        member.updated_at = updated_at;
        Ok(member.clone())
    }

    async fn increment_member_points(
        &self,
        member_id: &MemberId,
        delta: i64,
        levels: &LevelTable,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<PointsBalance> {
        let mut guard = self.members.write().map_err(|_| poisoned("members"))?;
        let member = guard
            .get_mut(member_id)
            .ok_or_else(|| StorageError::NotFound(format!("member {member_id} not found")))?;

        let points = member.points.checked_add(delta).ok_or_else(|| {
            StorageError::InvariantViolation(format!("points overflow for member {member_id}"))
        })?;
        if points < 0 {
            return Err(StorageError::InvariantViolation(format!(
                "member {member_id} would drop to {points} points"
            )));
        }

        member.points = points;
        member.level = levels.level_of(points);
        member.updated_at = updated_at;

        Ok(PointsBalance {
            member_id: member_id.clone(),
            points: member.points,
            level: member.level,
        })
    }

    async fn delete_member(&self, member_id: &MemberId) -> StorageResult<usize> {
        let mut members = self.members.write().map_err(|_| poisoned("members"))?;
        let mut contributions = self
            .contributions
            .write()
            .map_err(|_| poisoned("contributions"))?;
        let mut participants = self
            .participants
            .write()
            .map_err(|_| poisoned("participants"))?;

        if members.remove(member_id).is_none() {
            return Err(StorageError::NotFound(format!(
                "member {member_id} not found"
            )));
        }

        let before = contributions.len();
        contributions.retain(|_, c| &c.member_id != member_id);
        participants.retain(|(_, participant), _| participant != member_id);
        Ok(before - contributions.len())
    }
}

#[async_trait]
impl ContributionStore for InMemoryClubStorage {
    async fn insert_contribution(&self, record: NewContribution) -> StorageResult<Contribution> {
        let members = self.members.read().map_err(|_| poisoned("members"))?;
        if !members.contains_key(&record.member_id) {
            return Err(StorageError::NotFound(format!(
                "member {} not found",
                record.member_id
            )));
        }

        let mut guard = self
            .contributions
            .write()
            .map_err(|_| poisoned("contributions"))?;
        if let Some(key) = record.idempotency_key.as_deref() {
            if guard
                .values()
                .any(|c| c.idempotency_key.as_deref() == Some(key))
            {
                return Err(StorageError::Conflict(format!(
                    "idempotency key {key} already used"
                )));
            }
        }

        let contribution = Contribution {
            id: ContributionId::generate(),
            member_id: record.member_id,
            recorded_by: record.recorded_by,
            description: record.description,
            points: record.points,
            contribution_type: record.contribution_type,
            activity_id: record.activity_id,
            idempotency_key: record.idempotency_key,
            created_at: record.created_at,
            updated_at: record.created_at,
        };
        guard.insert(contribution.id.clone(), contribution.clone());
        Ok(contribution)
    }

    async fn get_contribution(
        &self,
        contribution_id: &ContributionId,
    ) -> StorageResult<Option<Contribution>> {
        let guard = self
            .contributions
            .read()
            .map_err(|_| poisoned("contributions"))?;
        Ok(guard.get(contribution_id).cloned())
    }

    async fn find_contribution_by_key(&self, key: &str) -> StorageResult<Option<Contribution>> {
        let guard = self
            .contributions
            .read()
            .map_err(|_| poisoned("contributions"))?;
        Ok(guard
            .values()
            .find(|c| c.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn update_contribution(
        &self,
        contribution_id: &ContributionId,
        update: ContributionUpdate,
    ) -> StorageResult<ContributionRevision> {
        let mut guard = self
            .contributions
            .write()
            .map_err(|_| poisoned("contributions"))?;
        let record = guard.get_mut(contribution_id).ok_or_else(|| {
            StorageError::NotFound(format!("contribution {contribution_id} not found"))
        })?;

        let previous_points = record.points;
        record.description = update.description;
        record.points = update.points;
        record.contribution_type = update.contribution_type;
        record.activity_id = update.activity_id;
        record.updated_at = update.updated_at;
        Ok(ContributionRevision {
            previous_points,
            contribution: record.clone(),
        })
    }

    async fn delete_contribution(
        &self,
        contribution_id: &ContributionId,
    ) -> StorageResult<Contribution> {
        let mut guard = self
            .contributions
            .write()
            .map_err(|_| poisoned("contributions"))?;
        guard
            .remove(contribution_id)
            .ok_or_else(|| StorageError::NotFound(format!("contribution {contribution_id} not found")))
    }

    async fn list_contributions(&self, window: QueryWindow) -> StorageResult<Vec<Contribution>> {
        let guard = self
            .contributions
            .read()
            .map_err(|_| poisoned("contributions"))?;
        let mut values = guard.values().cloned().collect::<Vec<_>>();
        sort_newest_first(&mut values);
        Ok(apply_window(values, window))
    }

    async fn list_contributions_for_member(
        &self,
        member_id: &MemberId,
    ) -> StorageResult<Vec<Contribution>> {
        let guard = self
            .contributions
            .read()
            .map_err(|_| poisoned("contributions"))?;
        let mut values = guard
            .values()
            .filter(|c| &c.member_id == member_id)
            .cloned()
            .collect::<Vec<_>>();
        sort_newest_first(&mut values);
        Ok(values)
    }
}

#[async_trait]
impl ActivityStore for InMemoryClubStorage {
    async fn insert_activity(&self, activity: Activity) -> StorageResult<Activity> {
        let mut guard = self.activities.write().map_err(|_| poisoned("activities"))?;
        if guard.contains_key(&activity.id) {
            return Err(StorageError::Conflict(format!(
                "activity {} already exists",
                activity.id
            )));
        }
        guard.insert(activity.id.clone(), activity.clone());
        Ok(activity)
    }

    async fn get_activity(&self, activity_id: &ActivityId) -> StorageResult<Option<Activity>> {
        let guard = self.activities.read().map_err(|_| poisoned("activities"))?;
        Ok(guard.get(activity_id).cloned())
    }

    async fn list_activities(&self) -> StorageResult<Vec<Activity>> {
        let guard = self.activities.read().map_err(|_| poisoned("activities"))?;
        let mut values = guard.values().cloned().collect::<Vec<_>>();
        values.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.title.cmp(&b.title)));
        Ok(values)
    }

    async fn register_participant(
        &self,
        activity_id: &ActivityId,
        member_id: &MemberId,
        at: DateTime<Utc>,
    ) -> StorageResult<Participant> {
        let members = self.members.read().map_err(|_| poisoned("members"))?;
        if !members.contains_key(member_id) {
            return Err(StorageError::NotFound(format!(
                "member {member_id} not found"
            )));
        }
        let activities = self.activities.read().map_err(|_| poisoned("activities"))?;
        let activity = activities.get(activity_id).ok_or_else(|| {
            StorageError::NotFound(format!("activity {activity_id} not found"))
        })?;
        let mut participants = self
            .participants
            .write()
            .map_err(|_| poisoned("participants"))?;

        let key = (activity_id.clone(), member_id.clone());
        if let Some(existing) = participants.get(&key) {
            if existing.is_registered() {
                return Ok(existing.clone());
            }
        }

        if let Some(capacity) = activity.max_participants {
            let registered = participants
                .values()
                .filter(|p| &p.activity_id == activity_id && p.is_registered())
                .count();
            if registered >= capacity as usize {
                return Err(StorageError::CapacityExceeded(format!(
                    "activity {activity_id} is full ({capacity} participants)"
                )));
            }
        }

        let participant = Participant {
            activity_id: activity_id.clone(),
            member_id: member_id.clone(),
            status: ParticipantStatus::Registered,
            updated_at: at,
        };
        participants.insert(key, participant.clone());
        Ok(participant)
    }

    async fn cancel_participant(
        &self,
        activity_id: &ActivityId,
        member_id: &MemberId,
        at: DateTime<Utc>,
    ) -> StorageResult<Participant> {
        let mut participants = self
            .participants
            .write()
            .map_err(|_| poisoned("participants"))?;
        let participant = participants
            .get_mut(&(activity_id.clone(), member_id.clone()))
            .ok_or_else(|| {
                StorageError::NotFound(format!(
                    "member {member_id} is not registered for activity {activity_id}"
                ))
            })?;
        participant.status = ParticipantStatus::Cancelled;
        participant.updated_at = at;
        Ok(participant.clone())
    }

    async fn list_participants(&self, activity_id: &ActivityId) -> StorageResult<Vec<Participant>> {
        let guard = self
            .participants
            .read()
            .map_err(|_| poisoned("participants"))?;
        let mut values = guard
            .values()
            .filter(|p| &p.activity_id == activity_id)
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(values)
    }
}

fn sort_newest_first(values: &mut [Contribution]) {
    values.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

fn apply_window<T>(items: Vec<T>, window: QueryWindow) -> Vec<T> {
    let iter = items.into_iter().skip(window.offset);
    if window.limit == 0 {
        iter.collect()
    } else {
        iter.take(window.limit).collect()
    }
}
