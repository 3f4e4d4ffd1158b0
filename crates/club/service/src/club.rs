use crate::activities::ActivityService;
use crate::analytics::Analytics;
use crate::config::ClubConfig;
use crate::leaderboard::Leaderboard;
use crate::membership::MembershipService;
use crate::{ServiceError, ServiceResult};
use club_ledger::{ContributionLedger, Reconciliation};
use club_storage::memory::InMemoryClubStorage;
use club_storage::{Clock, ClubStorage, NotificationSink, QueryWindow, SystemClock, TracingNotificationSink};
use club_types::{Member, MemberId, Role};
use std::sync::Arc;
use tracing::info;

/// Every club service wired against one storage backend.
pub struct Club {
    config: ClubConfig,
    storage: Arc<dyn ClubStorage>,
    ledger: ContributionLedger,
    membership: MembershipService,
    activities: ActivityService,
}

impl Club {
    /// Validate `config` and build the services from it.
    pub fn from_config(
        config: ClubConfig,
        storage: Arc<dyn ClubStorage>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> ServiceResult<Self> {
        config.validate()?;
        let hierarchy = config.role_hierarchy()?;
        let levels = config.level_table()?;

        let ledger = ContributionLedger::new(storage.clone(), notifier.clone(), clock.clone())
            .with_hierarchy(hierarchy.clone())
            .with_levels(levels.clone())
            .with_config(config.ledger.clone());
        let membership = MembershipService::new(
            storage.clone(),
            notifier,
            clock.clone(),
            hierarchy.clone(),
            levels,
        );
        let activities = ActivityService::new(storage.clone(), clock, hierarchy);

        info!(
            edit_window_secs = config.ledger.edit_window_secs,
            delete_window_secs = config.ledger.delete_window_secs,
            "Club services ready"
        );

        Ok(Self {
            config,
            storage,
            ledger,
            membership,
            activities,
        })
    }

    /// In-memory storage, tracing notifications and the wall clock.
    pub fn in_memory(config: ClubConfig) -> ServiceResult<Self> {
        Self::from_config(
            config,
            Arc::new(InMemoryClubStorage::new()),
            Arc::new(TracingNotificationSink),
            Arc::new(SystemClock),
        )
    }

    pub fn config(&self) -> &ClubConfig {
        &self.config
    }

    pub fn ledger(&self) -> &ContributionLedger {
        &self.ledger
    }

    pub fn membership(&self) -> &MembershipService {
        &self.membership
    }

    pub fn activities(&self) -> &ActivityService {
        &self.activities
    }

    pub async fn leaderboard(&self) -> ServiceResult<Leaderboard> {
        let members = self.storage.list_members().await?;
        let contributions = self.storage.list_contributions(QueryWindow::all()).await?;
        Ok(Leaderboard::build(&members, &contributions))
    }

    pub async fn analytics(&self) -> ServiceResult<Analytics> {
        let members = self.storage.list_members().await?;
        let contributions = self.storage.list_contributions(QueryWindow::all()).await?;
        Ok(Analytics::compute(&members, &contributions))
    }

    /// Re-derive a member's points from their contributions. Admin or
    /// president only.
    pub async fn reconcile_member(
        &self,
        actor: &Member,
        member_id: &MemberId,
    ) -> ServiceResult<Reconciliation> {
        if !matches!(actor.role, Role::Admin | Role::President) {
            return Err(ServiceError::Forbidden(format!(
                "{} may not reconcile points",
                actor.role
            )));
        }
        Ok(self.ledger.reconcile_member(member_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use club_ledger::ErrorKind;
    use club_storage::{InMemoryNotificationSink, ManualClock};
    use club_types::{ContributionDraft, ContributionType, Level};

    fn club() -> (Club, Arc<InMemoryNotificationSink>) {
        let sink = Arc::new(InMemoryNotificationSink::new());
        let club = Club::from_config(
            ClubConfig::default(),
            Arc::new(InMemoryClubStorage::new()),
            sink.clone(),
            Arc::new(ManualClock::default()),
        )
        .unwrap();
        (club, sink)
    }

    #[tokio::test]
    async fn end_to_end_award_and_leaderboard() {
        let (club, sink) = club();
        let admin = club
            .membership()
            .bootstrap_profile(MemberId::new("root"), "root", None)
            .await
            .unwrap();
        // first account is promoted out of band
        let admin = Member { role: Role::Admin, ..admin };

        let ada = club
            .membership()
            .bootstrap_profile(MemberId::new("ada"), "ada", Some("Ada"))
            .await
            .unwrap();
        let bob = club
            .membership()
            .bootstrap_profile(MemberId::new("bob"), "bob", None)
            .await
            .unwrap();

        let president = club
            .membership()
            .update_member_role(&admin, &bob.id, Role::President)
            .await
            .unwrap();

        club.ledger()
            .create_contribution(
                &president,
                &ada.id,
                ContributionDraft::suggested(ContributionType::CompetitionWin, "regional win"),
            )
            .await
            .unwrap();
        club.ledger()
            .create_contribution(&president, &ada.id, ContributionDraft::new("mentoring", 15))
            .await
            .unwrap();

        let board = club.leaderboard().await.unwrap();
        let top = &board.entries()[0];
        assert_eq!(top.member_id, ada.id);
        assert_eq!(top.points, 65);
        assert_eq!(top.level, Level::Silver);
        assert_eq!(top.contributions, 2);

        let analytics = club.analytics().await.unwrap();
        assert_eq!(analytics.total_contributions, 2);
        assert_eq!(analytics.total_points_awarded, 65);

        // role change + two awards; award notices are delivered off-task
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert_eq!(sink.delivered().len(), 3);

        let report = club.reconcile_member(&president, &ada.id).await.unwrap();
        assert!(report.was_consistent());
        let denied = club.reconcile_member(&ada, &ada.id).await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn configured_points_range_reaches_the_ledger() {
        let mut config = ClubConfig::default();
        config.ledger.max_points = 10;
        let club = Club::in_memory(config).unwrap();

        let president = Member::new(MemberId::new("pres"), "pres", &Default::default())
            .with_role(Role::President);
        let err = club
            .ledger()
            .create_contribution(&president, &MemberId::new("ada"), ContributionDraft::new("x", 11))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ClubConfig::default();
        config.hierarchy.ranks.insert("treasurer".to_string(), 0);
        assert!(matches!(
            Club::in_memory(config),
            Err(ServiceError::Config(_))
        ));
    }
}
