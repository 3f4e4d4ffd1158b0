//! Identity-aware checks: the role-level predicates plus "never yourself".

use crate::RoleHierarchy;
use club_types::{Member, Role};
use thiserror::Error;

/// Why an actor was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleDenial {
    #[error("members cannot act on their own profile")]
    SelfTarget,

    #[error("{actor} may not manage a member holding {target}")]
    CannotManage { actor: Role, target: Role },

    #[error("{actor} may not assign the {role} role")]
    NotAssignable { actor: Role, role: Role },

    #[error("{actor} may not record contributions for a member holding {target}")]
    CannotRecord { actor: Role, target: Role },

    #[error("{actor} may not create activities")]
    CannotCreateActivity { actor: Role },
}

impl RoleHierarchy {
    /// Whether `actor` may change `target`'s role at all.
    pub fn can_manage_member(&self, actor: &Member, target: &Member) -> bool {
        actor.id != target.id && self.can_manage_role(actor.role, target.role)
    }

    /// Whether `actor` may record a contribution for `target`.
    pub fn can_record_for_member(&self, actor: &Member, target: &Member) -> bool {
        actor.id != target.id && self.can_record_contribution_for(actor.role, target.role)
    }

    /// Full check for moving `target` to `new_role`.
    pub fn authorize_role_change(
        &self,
        actor: &Member,
        target: &Member,
        new_role: Role,
    ) -> Result<(), RoleDenial> {
        if actor.id == target.id {
            return Err(RoleDenial::SelfTarget);
        }
        if !self.can_manage_role(actor.role, target.role) {
            return Err(RoleDenial::CannotManage {
                actor: actor.role,
                target: target.role,
            });
        }
        if !self.assignable_roles(actor.role).contains(&new_role) {
            return Err(RoleDenial::NotAssignable {
                actor: actor.role,
                role: new_role,
            });
        }
        Ok(())
    }

    pub fn authorize_contribution(&self, actor: &Member, target: &Member) -> Result<(), RoleDenial> {
        if actor.id == target.id {
            return Err(RoleDenial::SelfTarget);
        }
        if !self.can_record_contribution_for(actor.role, target.role) {
            return Err(RoleDenial::CannotRecord {
                actor: actor.role,
                target: target.role,
            });
        }
        Ok(())
    }

    pub fn authorize_activity_creation(&self, actor: &Member) -> Result<(), RoleDenial> {
        if self.can_create_activity(actor.role) {
            Ok(())
        } else {
            Err(RoleDenial::CannotCreateActivity { actor: actor.role })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use club_types::{LevelTable, MemberId};

    fn member(id: &str, role: Role) -> Member {
        Member::new(MemberId::new(id), id, &LevelTable::default()).with_role(role)
    }

    #[test]
    fn self_is_never_manageable() {
        let h = RoleHierarchy::default();
        let admin = member("root", Role::Admin);
        assert!(!h.can_manage_member(&admin, &admin));
        assert_eq!(
            h.authorize_role_change(&admin, &admin, Role::Member),
            Err(RoleDenial::SelfTarget)
        );
    }

    #[test]
    fn self_check_precedes_rank_rules_for_contributions() {
        let h = RoleHierarchy::default();
        let president = member("p", Role::President);
        assert_eq!(
            h.authorize_contribution(&president, &president),
            Err(RoleDenial::SelfTarget)
        );
        assert!(!h.can_record_for_member(&president, &president));
    }

    #[test]
    fn role_change_must_target_lower_member() {
        let h = RoleHierarchy::default();
        let treasurer = member("t", Role::Treasurer);
        let vp = member("vp", Role::VicePresident);
        assert_eq!(
            h.authorize_role_change(&treasurer, &vp, Role::Member),
            Err(RoleDenial::CannotManage {
                actor: Role::Treasurer,
                target: Role::VicePresident
            })
        );
    }

    #[test]
    fn role_change_cannot_grant_peer_role() {
        let h = RoleHierarchy::default();
        let vp = member("vp", Role::VicePresident);
        let m = member("m", Role::Member);
        assert_eq!(
            h.authorize_role_change(&vp, &m, Role::VicePresident),
            Err(RoleDenial::NotAssignable {
                actor: Role::VicePresident,
                role: Role::VicePresident
            })
        );
        assert!(h.authorize_role_change(&vp, &m, Role::Treasurer).is_ok());
    }

    #[test]
    fn admin_may_promote_to_president_but_not_admin() {
        let h = RoleHierarchy::default();
        let admin = member("a", Role::Admin);
        let m = member("m", Role::Member);
        assert!(h.authorize_role_change(&admin, &m, Role::President).is_ok());
        assert!(h.authorize_role_change(&admin, &m, Role::Admin).is_err());
    }

    #[test]
    fn senior_executive_cannot_record_for_treasurer() {
        let h = RoleHierarchy::default();
        let se = member("se", Role::SeniorExecutive);
        let t = member("t", Role::Treasurer);
        assert!(matches!(
            h.authorize_contribution(&se, &t),
            Err(RoleDenial::CannotRecord { .. })
        ));
    }

    #[test]
    fn members_cannot_create_activities() {
        let h = RoleHierarchy::default();
        assert!(h.authorize_activity_creation(&member("m", Role::Member)).is_err());
        assert!(h.authorize_activity_creation(&member("t", Role::Treasurer)).is_ok());
    }
}
