//! Member profiles: bootstrap, role management and administrative removal.

use crate::{ServiceError, ServiceResult};
use club_roles::{RoleDenial, RoleHierarchy};
use club_storage::{Clock, ClubStorage, NotificationSink, StorageError};
use club_types::{LevelTable, Member, MemberId, Notification, Role};
use std::sync::Arc;
use tracing::{info, warn};

pub struct MembershipService {
    storage: Arc<dyn ClubStorage>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    hierarchy: RoleHierarchy,
    levels: LevelTable,
}

impl MembershipService {
    pub fn new(
        storage: Arc<dyn ClubStorage>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        hierarchy: RoleHierarchy,
        levels: LevelTable,
    ) -> Self {
        Self {
            storage,
            notifier,
            clock,
            hierarchy,
            levels,
        }
    }

    /// Return the member's profile, creating it on first sign-in.
    pub async fn bootstrap_profile(
        &self,
        member_id: MemberId,
        username: &str,
        full_name: Option<&str>,
    ) -> ServiceResult<Member> {
        if let Some(existing) = self.storage.get_member(&member_id).await? {
            return Ok(existing);
        }

        let username = username.trim();
        if username.is_empty() {
            return Err(ServiceError::Validation(
                "username must not be empty".to_string(),
            ));
        }

        let mut member =
            Member::new(member_id, username, &self.levels).with_created_at(self.clock.now());
        if let Some(name) = full_name.map(str::trim).filter(|n| !n.is_empty()) {
            member = member.with_full_name(name);
        }

        let member = self.storage.insert_member(member).await?;
        info!(member = %member.id, username = %member.username, "Profile created");
        Ok(member)
    }

    pub async fn member(&self, member_id: &MemberId) -> ServiceResult<Member> {
        self.storage
            .get_member(member_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("member {member_id}")))
    }

    pub async fn members(&self) -> ServiceResult<Vec<Member>> {
        Ok(self.storage.list_members().await?)
    }

    /// Move `target_id` to `new_role` on behalf of `actor`.
    pub async fn update_member_role(
        &self,
        actor: &Member,
        target_id: &MemberId,
        new_role: Role,
    ) -> ServiceResult<Member> {
        let target = self.member(target_id).await?;

        if let Err(denial) = self.hierarchy.authorize_role_change(actor, &target, new_role) {
            warn!(
                actor = %actor.id,
                actor_role = %actor.role,
                target = %target.id,
                target_role = %target.role,
                requested = %new_role,
                reason = %denial,
                "Role change rejected"
            );
            return Err(denial.into());
        }
        if target.role == new_role {
            return Err(ServiceError::Validation(format!(
                "{} already holds the {} role",
                target.username, new_role
            )));
        }

        let updated = self
            .storage
            .update_member_role(target_id, new_role, self.clock.now())
            .await?;
        info!(
            actor = %actor.id,
            member = %updated.id,
            from = %target.role,
            to = %updated.role,
            "Role changed"
        );

        let notification = Notification::new(
            updated.id.clone(),
            "Role updated",
            format!("Your role is now {}", updated.role.label()),
            self.clock.now(),
        );
        if let Err(err) = self.notifier.notify(notification).await {
            warn!(member = %updated.id, error = %err, "Notification not delivered");
        }

        Ok(updated)
    }

    /// Members whose role `actor` may change, highest points first.
    pub async fn manageable_members(&self, actor: &Member) -> ServiceResult<Vec<Member>> {
        let members = self.storage.list_members().await?;
        Ok(members
            .into_iter()
            .filter(|m| self.hierarchy.can_manage_member(actor, m))
            .collect())
    }

    /// Remove a member and every contribution they received. Admin only.
    pub async fn delete_member(&self, actor: &Member, target_id: &MemberId) -> ServiceResult<usize> {
        if actor.role != Role::Admin {
            warn!(actor = %actor.id, target = %target_id, "Member delete rejected");
            return Err(ServiceError::Forbidden(
                "only an admin may delete members".to_string(),
            ));
        }
        if &actor.id == target_id {
            return Err(RoleDenial::SelfTarget.into());
        }

        let target = self.member(target_id).await?;
        if !self.hierarchy.can_manage_member(actor, &target) {
            return Err(RoleDenial::CannotManage {
                actor: actor.role,
                target: target.role,
            }
            .into());
        }

        let removed = match self.storage.delete_member(target_id).await {
            Ok(removed) => removed,
            Err(StorageError::NotFound(_)) => {
                return Err(ServiceError::NotFound(format!("member {target_id}")))
            }
            Err(err) => return Err(err.into()),
        };
        info!(
            actor = %actor.id,
            member = %target_id,
            contributions = removed,
            "Member deleted"
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use club_storage::memory::InMemoryClubStorage;
    use club_storage::{ContributionStore, InMemoryNotificationSink, MemberStore, NewContribution, SystemClock};
    use club_types::{ContributionType, Level};

    struct Fixture {
        service: MembershipService,
        storage: Arc<InMemoryClubStorage>,
        sink: Arc<InMemoryNotificationSink>,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(InMemoryClubStorage::new());
        let sink = Arc::new(InMemoryNotificationSink::new());
        let service = MembershipService::new(
            storage.clone(),
            sink.clone(),
            Arc::new(SystemClock),
            RoleHierarchy::default(),
            LevelTable::default(),
        );
        Fixture {
            service,
            storage,
            sink,
        }
    }

    async fn seed(storage: &InMemoryClubStorage, id: &str, role: Role) -> Member {
        let member = Member::new(MemberId::new(id), id, &LevelTable::default()).with_role(role);
        storage.insert_member(member).await.unwrap()
    }

    #[tokio::test]
    async fn bootstrap_creates_then_returns_existing() {
        let fx = fixture();
        let created = fx
            .service
            .bootstrap_profile(MemberId::new("u-1"), " ada ", Some("Ada Lovelace"))
            .await
            .unwrap();
        assert_eq!(created.username, "ada");
        assert_eq!(created.role, Role::Member);
        assert_eq!(created.points, 0);
        assert_eq!(created.level, Level::Bronze);
        assert_eq!(created.display_name(), "Ada Lovelace");

        let again = fx
            .service
            .bootstrap_profile(MemberId::new("u-1"), "someone-else", None)
            .await
            .unwrap();
        assert_eq!(again, created);
    }

    #[tokio::test]
    async fn bootstrap_rejects_blank_and_duplicate_usernames() {
        let fx = fixture();
        let blank = fx
            .service
            .bootstrap_profile(MemberId::new("u-1"), "  ", None)
            .await;
        assert!(matches!(blank, Err(ServiceError::Validation(_))));

        fx.service
            .bootstrap_profile(MemberId::new("u-1"), "ada", None)
            .await
            .unwrap();
        let dup = fx
            .service
            .bootstrap_profile(MemberId::new("u-2"), "ada", None)
            .await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn president_promotes_member_and_target_is_notified() {
        let fx = fixture();
        let president = seed(&fx.storage, "pres", Role::President).await;
        let ada = seed(&fx.storage, "ada", Role::Member).await;

        let updated = fx
            .service
            .update_member_role(&president, &ada.id, Role::Treasurer)
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Treasurer);
        assert_eq!(fx.sink.delivered_to(&ada.id).len(), 1);
    }

    #[tokio::test]
    async fn peers_and_superiors_cannot_be_changed() {
        let fx = fixture();
        let treasurer = seed(&fx.storage, "tre", Role::Treasurer).await;
        let other = seed(&fx.storage, "tre-2", Role::Treasurer).await;
        let vp = seed(&fx.storage, "vp", Role::VicePresident).await;

        let peer = fx
            .service
            .update_member_role(&treasurer, &other.id, Role::Member)
            .await;
        assert!(matches!(peer, Err(ServiceError::Forbidden(_))));

        let superior = fx
            .service
            .update_member_role(&treasurer, &vp.id, Role::Member)
            .await;
        assert!(matches!(superior, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn cannot_grant_a_role_at_or_above_own_rank() {
        let fx = fixture();
        let vp = seed(&fx.storage, "vp", Role::VicePresident).await;
        let ada = seed(&fx.storage, "ada", Role::Member).await;
        let result = fx
            .service
            .update_member_role(&vp, &ada.id, Role::VicePresident)
            .await;
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn self_demotion_is_rejected() {
        let fx = fixture();
        let admin = seed(&fx.storage, "root", Role::Admin).await;
        let result = fx
            .service
            .update_member_role(&admin, &admin.id, Role::Member)
            .await;
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn assigning_current_role_is_a_validation_error() {
        let fx = fixture();
        let president = seed(&fx.storage, "pres", Role::President).await;
        let ada = seed(&fx.storage, "ada", Role::Member).await;
        let result = fx
            .service
            .update_member_role(&president, &ada.id, Role::Member)
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn manageable_members_excludes_self_and_superiors() {
        let fx = fixture();
        let vp = seed(&fx.storage, "vp", Role::VicePresident).await;
        seed(&fx.storage, "pres", Role::President).await;
        seed(&fx.storage, "tre", Role::Treasurer).await;
        seed(&fx.storage, "ada", Role::Member).await;

        let mut names = fx
            .service
            .manageable_members(&vp)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.username)
            .collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, vec!["ada", "tre"]);
    }

    #[tokio::test]
    async fn admin_delete_cascades_contributions() {
        let fx = fixture();
        let admin = seed(&fx.storage, "root", Role::Admin).await;
        let ada = seed(&fx.storage, "ada", Role::Member).await;
        fx.storage
            .insert_contribution(NewContribution {
                member_id: ada.id.clone(),
                recorded_by: admin.id.clone(),
                description: "talk".to_string(),
                points: 20,
                contribution_type: ContributionType::Presentation,
                activity_id: None,
                idempotency_key: None,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        let removed = fx.service.delete_member(&admin, &ada.id).await.unwrap();
        assert_eq!(removed, 1);
        assert!(matches!(
            fx.service.member(&ada.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn only_admin_deletes_and_never_self_or_admin() {
        let fx = fixture();
        let admin = seed(&fx.storage, "root", Role::Admin).await;
        let other_admin = seed(&fx.storage, "root-2", Role::Admin).await;
        let president = seed(&fx.storage, "pres", Role::President).await;
        let ada = seed(&fx.storage, "ada", Role::Member).await;

        assert!(matches!(
            fx.service.delete_member(&president, &ada.id).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            fx.service.delete_member(&admin, &admin.id).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            fx.service.delete_member(&admin, &other_admin.id).await,
            Err(ServiceError::Forbidden(_))
        ));
    }
}
