//! Scheduled activities and participant registration.

use crate::{ServiceError, ServiceResult};
use club_roles::RoleHierarchy;
use club_storage::{Clock, ClubStorage, StorageError};
use club_types::{Activity, ActivityDraft, ActivityId, Member, Participant};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ActivityService {
    storage: Arc<dyn ClubStorage>,
    clock: Arc<dyn Clock>,
    hierarchy: RoleHierarchy,
}

impl ActivityService {
    pub fn new(storage: Arc<dyn ClubStorage>, clock: Arc<dyn Clock>, hierarchy: RoleHierarchy) -> Self {
        Self {
            storage,
            clock,
            hierarchy,
        }
    }

    pub async fn create_activity(&self, actor: &Member, draft: ActivityDraft) -> ServiceResult<Activity> {
        if let Err(denial) = self.hierarchy.authorize_activity_creation(actor) {
            warn!(actor = %actor.id, actor_role = %actor.role, "Activity creation rejected");
            return Err(denial.into());
        }

        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ServiceError::Validation("title must not be empty".to_string()));
        }
        if draft.max_participants == Some(0) {
            return Err(ServiceError::Validation(
                "max_participants must be at least 1".to_string(),
            ));
        }

        let activity = Activity {
            id: ActivityId::generate(),
            title: title.to_string(),
            description: draft
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            date: draft.date,
            activity_type: draft.activity_type,
            max_participants: draft.max_participants,
            created_by: actor.id.clone(),
            created_at: self.clock.now(),
        };

        let activity = self.storage.insert_activity(activity).await?;
        info!(
            activity = %activity.id,
            title = %activity.title,
            kind = %activity.activity_type,
            created_by = %actor.id,
            "Activity created"
        );
        Ok(activity)
    }

    /// Activities, latest date first.
    pub async fn activities(&self) -> ServiceResult<Vec<Activity>> {
        Ok(self.storage.list_activities().await?)
    }

    pub async fn activity(&self, activity_id: &ActivityId) -> ServiceResult<Activity> {
        self.storage
            .get_activity(activity_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("activity {activity_id}")))
    }

    /// Register `member`. Registering twice returns the existing registration.
    pub async fn register(&self, member: &Member, activity_id: &ActivityId) -> ServiceResult<Participant> {
        match self
            .storage
            .register_participant(activity_id, &member.id, self.clock.now())
            .await
        {
            Ok(participant) => {
                info!(activity = %activity_id, member = %member.id, "Registered for activity");
                Ok(participant)
            }
            Err(StorageError::CapacityExceeded(_)) => {
                debug!(activity = %activity_id, member = %member.id, "Activity full");
                Err(ServiceError::ActivityFull(activity_id.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn unregister(&self, member: &Member, activity_id: &ActivityId) -> ServiceResult<Participant> {
        let participant = self
            .storage
            .cancel_participant(activity_id, &member.id, self.clock.now())
            .await?;
        info!(activity = %activity_id, member = %member.id, "Registration cancelled");
        Ok(participant)
    }

    pub async fn participants(&self, activity_id: &ActivityId) -> ServiceResult<Vec<Participant>> {
        Ok(self.storage.list_participants(activity_id).await?)
    }
}
