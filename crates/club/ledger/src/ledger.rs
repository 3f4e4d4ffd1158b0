use crate::error::LedgerAction;
use crate::{LedgerConfig, LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use club_roles::RoleHierarchy;
use club_storage::{
    Clock, ClubStorage, ContributionUpdate, NewContribution, NotificationSink, StorageError,
    StorageResult,
};
use club_types::{
    Contribution, ContributionDraft, ContributionId, ContributionPatch, Level, LevelTable, Member,
    MemberId, Notification, PointsBalance, Role,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Orchestrates contribution mutations against the points-and-level model.
pub struct ContributionLedger {
    pub(crate) storage: Arc<dyn ClubStorage>,
    notifier: Arc<dyn NotificationSink>,
    pub(crate) clock: Arc<dyn Clock>,
    hierarchy: RoleHierarchy,
    pub(crate) levels: LevelTable,
    config: LedgerConfig,
}

impl ContributionLedger {
    /// Ledger with the default hierarchy, level table and config.
    pub fn new(
        storage: Arc<dyn ClubStorage>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            notifier,
            clock,
            hierarchy: RoleHierarchy::default(),
            levels: LevelTable::default(),
            config: LedgerConfig::default(),
        }
    }

    pub fn with_hierarchy(mut self, hierarchy: RoleHierarchy) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    pub fn with_levels(mut self, levels: LevelTable) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn level_of(&self, points: i64) -> Level {
        self.levels.level_of(points)
    }

    /// Record `draft` for `target_id` on behalf of `actor`.
    ///
    /// With an idempotency key that was already used for the same target,
    /// the stored record is returned and no points are applied.
    pub async fn create_contribution(
        &self,
        actor: &Member,
        target_id: &MemberId,
        draft: ContributionDraft,
    ) -> LedgerResult<Contribution> {
        self.validate_fields(&draft.description, draft.points)?;

        let target = self.load_member(target_id).await?;
        if let Err(denial) = self.hierarchy.authorize_contribution(actor, &target) {
            warn!(
                actor = %actor.id,
                actor_role = %actor.role,
                target = %target.id,
                target_role = %target.role,
                reason = %denial,
                "Contribution rejected"
            );
            return Err(denial.into());
        }

        let key = draft.idempotency_key.clone();
        if let Some(key) = key.as_deref() {
            if let Some(existing) = self.replay(key, target_id).await? {
                return Ok(existing);
            }
        }

        let now = self.clock.now();
        let record = NewContribution {
            member_id: target.id.clone(),
            recorded_by: actor.id.clone(),
            description: draft.description.trim().to_string(),
            points: draft.points,
            contribution_type: draft.contribution_type,
            activity_id: draft.activity_id,
            idempotency_key: draft.idempotency_key,
            created_at: now,
        };

        let contribution = match self
            .timed("insert_contribution", self.storage.insert_contribution(record))
            .await?
        {
            Ok(contribution) => contribution,
            Err(StorageError::Conflict(reason)) => {
                // A concurrent submission with the same key won the insert.
                if let Some(key) = key.as_deref() {
                    if let Some(existing) = self.replay(key, target_id).await? {
                        return Ok(existing);
                    }
                }
                return Err(StorageError::Conflict(reason).into());
            }
            Err(err) => return Err(err.into()),
        };

        let balance = self
            .apply_points(&contribution, LedgerAction::Create, contribution.points, now)
            .await?;

        info!(
            contribution = %contribution.id,
            member = %contribution.member_id,
            recorded_by = %contribution.recorded_by,
            points = contribution.points,
            balance = balance.points,
            new_level = %balance.level,
            "Contribution recorded"
        );

        self.notify(
            &contribution.member_id,
            "Contribution recorded",
            format!(
                "{} awarded you {} points: {}",
                actor.display_name(),
                contribution.points,
                contribution.description
            ),
        );

        Ok(contribution)
    }

    /// Edit a contribution and apply the points difference to its target.
    ///
    /// The recorder, a president or an admin may edit. Everyone but admin is
    /// bound by the edit window.
    pub async fn update_contribution(
        &self,
        actor: &Member,
        contribution_id: &ContributionId,
        patch: ContributionPatch,
    ) -> LedgerResult<Contribution> {
        let existing = self.load_contribution(contribution_id).await?;
        self.authorize_edit(actor, &existing)?;

        let now = self.clock.now();
        if actor.role != Role::Admin {
            self.check_window(LedgerAction::Edit, &existing, now, self.config.edit_window())?;
        }

        if patch.is_empty() {
            return Err(LedgerError::Validation("edit changes nothing".to_string()));
        }
        let update = ContributionUpdate {
            description: patch
                .description
                .map(|d| d.trim().to_string())
                .unwrap_or_else(|| existing.description.clone()),
            points: patch.points.unwrap_or(existing.points),
            contribution_type: patch
                .contribution_type
                .unwrap_or(existing.contribution_type),
            activity_id: match patch.activity_id {
                Some(link) => link,
                None => existing.activity_id.clone(),
            },
            updated_at: now,
        };
        self.validate_fields(&update.description, update.points)?;

        // The delta comes from the points the store replaced, not from
        // `existing`, so concurrent edits cannot apply a stale baseline.
        let revision = self
            .call(
                "update_contribution",
                self.storage.update_contribution(contribution_id, update),
            )
            .await?;
        let delta = revision.delta();
        let previous_points = revision.previous_points;
        let updated = revision.contribution;
        if delta == 0 {
            info!(
                contribution = %updated.id,
                editor = %actor.id,
                "Contribution edited"
            );
            return Ok(updated);
        }

        let balance = self
            .apply_points(&updated, LedgerAction::Edit, delta, now)
            .await?;
        info!(
            contribution = %updated.id,
            member = %updated.member_id,
            editor = %actor.id,
            delta,
            balance = balance.points,
            new_level = %balance.level,
            "Contribution edited"
        );

        self.notify(
            &updated.member_id,
            "Contribution updated",
            format!(
                "Your contribution \"{}\" is now worth {} points (was {})",
                updated.description, updated.points, previous_points
            ),
        );

        Ok(updated)
    }

    /// Remove a contribution and take its points back from the target.
    ///
    /// Admin and president may always delete; the recorder only within the
    /// delete window.
    pub async fn delete_contribution(
        &self,
        actor: &Member,
        contribution_id: &ContributionId,
    ) -> LedgerResult<()> {
        let existing = self.load_contribution(contribution_id).await?;
        let now = self.clock.now();

        match actor.role {
            Role::Admin | Role::President => {}
            _ if actor.id == existing.recorded_by => {
                self.check_window(
                    LedgerAction::Delete,
                    &existing,
                    now,
                    self.config.delete_window(),
                )?;
            }
            _ => {
                warn!(
                    actor = %actor.id,
                    actor_role = %actor.role,
                    contribution = %existing.id,
                    "Delete rejected"
                );
                return Err(LedgerError::Forbidden(format!(
                    "{} may only delete contributions they recorded",
                    actor.role
                )));
            }
        }

        let removed = self
            .call(
                "delete_contribution",
                self.storage.delete_contribution(contribution_id),
            )
            .await?;

        let balance = self
            .apply_points(&removed, LedgerAction::Delete, -removed.points, now)
            .await?;
        info!(
            contribution = %removed.id,
            member = %removed.member_id,
            deleted_by = %actor.id,
            points = removed.points,
            balance = balance.points,
            new_level = %balance.level,
            "Contribution deleted"
        );

        self.notify(
            &removed.member_id,
            "Contribution removed",
            format!(
                "Your contribution \"{}\" was removed ({} points)",
                removed.description, removed.points
            ),
        );

        Ok(())
    }

    fn validate_fields(&self, description: &str, points: i64) -> LedgerResult<()> {
        if description.trim().is_empty() {
            return Err(LedgerError::Validation(
                "description must not be empty".to_string(),
            ));
        }
        if points < self.config.min_points || points > self.config.max_points {
            return Err(LedgerError::Validation(format!(
                "points must be between {} and {}, got {}",
                self.config.min_points, self.config.max_points, points
            )));
        }
        Ok(())
    }

    fn authorize_edit(&self, actor: &Member, existing: &Contribution) -> LedgerResult<()> {
        if actor.id == existing.member_id {
            warn!(actor = %actor.id, contribution = %existing.id, "Edit of own award rejected");
            return Err(LedgerError::Forbidden(
                "members cannot edit contributions awarded to themselves".to_string(),
            ));
        }
        let allowed = actor.id == existing.recorded_by
            || matches!(actor.role, Role::President | Role::Admin);
        if !allowed {
            warn!(
                actor = %actor.id,
                actor_role = %actor.role,
                contribution = %existing.id,
                "Edit rejected"
            );
            return Err(LedgerError::Forbidden(format!(
                "{} may only edit contributions they recorded",
                actor.role
            )));
        }
        Ok(())
    }

    /// `elapsed == window` is still inside the window.
    fn check_window(
        &self,
        action: LedgerAction,
        existing: &Contribution,
        now: DateTime<Utc>,
        window: chrono::Duration,
    ) -> LedgerResult<()> {
        let elapsed = now.signed_duration_since(existing.created_at);
        if elapsed > window {
            warn!(
                contribution = %existing.id,
                %action,
                elapsed_secs = elapsed.num_seconds(),
                window_secs = window.num_seconds(),
                "Contribution window expired"
            );
            return Err(LedgerError::expired(action, window));
        }
        Ok(())
    }

    async fn replay(&self, key: &str, target_id: &MemberId) -> LedgerResult<Option<Contribution>> {
        let Some(existing) = self
            .call(
                "find_contribution_by_key",
                self.storage.find_contribution_by_key(key),
            )
            .await?
        else {
            return Ok(None);
        };

        if &existing.member_id != target_id {
            return Err(LedgerError::Validation(format!(
                "idempotency key {key} was already used for another member"
            )));
        }
        debug!(contribution = %existing.id, key, "Replayed contribution");
        Ok(Some(existing))
    }

    /// Apply `delta` to the contribution's target. The record already exists
    /// at this point, so any failure is a partial failure.
    async fn apply_points(
        &self,
        contribution: &Contribution,
        action: LedgerAction,
        delta: i64,
        at: DateTime<Utc>,
    ) -> LedgerResult<PointsBalance> {
        let outcome = self
            .call(
                "increment_member_points",
                self.storage.increment_member_points(
                    &contribution.member_id,
                    delta,
                    &self.levels,
                    at,
                ),
            )
            .await;

        outcome.map_err(|err| {
            warn!(
                contribution = %contribution.id,
                member = %contribution.member_id,
                %action,
                delta,
                error = %err,
                "Points not applied; reconciliation required"
            );
            LedgerError::PartialFailure {
                action,
                contribution_id: contribution.id.clone(),
                member_id: contribution.member_id.clone(),
                reason: err.to_string(),
            }
        })
    }

    /// Hand the notification to a detached task. The mutation has already
    /// committed, so delivery never delays or fails the caller.
    fn notify(&self, member_id: &MemberId, title: &'static str, message: String) {
        let notification = Notification::new(member_id.clone(), title, message, self.clock.now());
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.config.collaborator_timeout();
        let member = member_id.clone();

        tokio::spawn(async move {
            match tokio::time::timeout(timeout, notifier.notify(notification)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(member = %member, title, error = %err, "Notification not delivered");
                }
                Err(_) => {
                    warn!(
                        member = %member,
                        title,
                        timeout_ms = timeout.as_millis() as u64,
                        "Notification timed out"
                    );
                }
            }
        });
    }

    pub(crate) async fn load_member(&self, member_id: &MemberId) -> LedgerResult<Member> {
        self.call("get_member", self.storage.get_member(member_id))
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("member {member_id}")))
    }

    async fn load_contribution(&self, contribution_id: &ContributionId) -> LedgerResult<Contribution> {
        self.call(
            "get_contribution",
            self.storage.get_contribution(contribution_id),
        )
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("contribution {contribution_id}")))
    }

    /// Run a collaborator call under the configured timeout, keeping the
    /// collaborator's own error untranslated.
    async fn timed<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = StorageResult<T>>,
    ) -> LedgerResult<StorageResult<T>> {
        tokio::time::timeout(self.config.collaborator_timeout(), fut)
            .await
            .map_err(|_| {
                LedgerError::Unavailable(format!(
                    "{op} timed out after {}ms",
                    self.config.collaborator_timeout_ms
                ))
            })
    }

    pub(crate) async fn call<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = StorageResult<T>>,
    ) -> LedgerResult<T> {
        Ok(self.timed(op, fut).await??)
    }
}
