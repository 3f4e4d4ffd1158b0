//! Role rank table and role-level predicates.

use club_types::{Role, TypesError};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Hierarchy errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Roles {first} and {second} share rank {rank}")]
    DuplicateRank {
        first: Role,
        second: Role,
        rank: u8,
    },

    #[error("Rank table is empty")]
    Empty,
}

impl From<TypesError> for HierarchyError {
    fn from(value: TypesError) -> Self {
        match value {
            TypesError::UnknownRole(name) => Self::UnknownRole(name),
            other => Self::UnknownRole(other.to_string()),
        }
    }
}

pub type HierarchyResult<T> = Result<T, HierarchyError>;

/// Strict total order over roles, by authority.
///
/// The default table is
/// `member=0, senior_executive=1, treasurer=2, vice_president=3, president=4, admin=5`.
/// A custom table may omit roles; asking for the rank of an omitted role
/// yields [`HierarchyError::UnknownRole`] and every predicate involving it
/// answers `false`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleHierarchy {
    ranks: HashMap<Role, u8>,
}

impl RoleHierarchy {
    /// Build a hierarchy from an explicit rank table. Ranks must be distinct.
    pub fn new(ranks: HashMap<Role, u8>) -> HierarchyResult<Self> {
        if ranks.is_empty() {
            return Err(HierarchyError::Empty);
        }

        let mut seen: BTreeMap<u8, Role> = BTreeMap::new();
        for role in Role::ALL {
            let Some(rank) = ranks.get(&role).copied() else {
                continue;
            };
            if let Some(first) = seen.insert(rank, role) {
                return Err(HierarchyError::DuplicateRank {
                    first,
                    second: role,
                    rank,
                });
            }
        }

        Ok(Self { ranks })
    }

    /// Build a hierarchy from role names, as found in configuration files.
    pub fn from_names(ranks: &BTreeMap<String, u8>) -> HierarchyResult<Self> {
        let parsed = ranks
            .iter()
            .map(|(name, rank)| Ok((name.parse::<Role>()?, *rank)))
            .collect::<HierarchyResult<HashMap<_, _>>>()?;
        Self::new(parsed)
    }

    /// The role's rank.
    pub fn rank_of(&self, role: Role) -> HierarchyResult<u8> {
        self.ranks
            .get(&role)
            .copied()
            .ok_or_else(|| HierarchyError::UnknownRole(role.to_string()))
    }

    /// Rank lookup by role name.
    pub fn rank_of_name(&self, name: &str) -> HierarchyResult<u8> {
        self.rank_of(name.parse::<Role>()?)
    }

    fn outranks(&self, acting: Role, target: Role) -> bool {
        match (self.rank_of(acting), self.rank_of(target)) {
            (Ok(a), Ok(t)) => a > t,
            _ => false,
        }
    }

    /// Whether `acting` may change a member currently holding `target`.
    pub fn can_manage_role(&self, acting: Role, target: Role) -> bool {
        if acting == Role::Admin {
            return target != Role::Admin && self.ranks.contains_key(&target);
        }
        self.outranks(acting, target)
    }

    /// Roles `acting` may hand out, lowest rank first.
    pub fn assignable_roles(&self, acting: Role) -> Vec<Role> {
        let Ok(acting_rank) = self.rank_of(acting) else {
            return Vec::new();
        };

        let mut roles: Vec<(u8, Role)> = self
            .ranks
            .iter()
            .filter(|(role, rank)| {
                if acting == Role::Admin {
                    **role != Role::Admin
                } else {
                    **rank < acting_rank
                }
            })
            .map(|(role, rank)| (*rank, *role))
            .collect();
        roles.sort_by_key(|(rank, _)| *rank);
        roles.into_iter().map(|(_, role)| role).collect()
    }

    /// Whether `acting` may record a contribution for a member holding `target`.
    pub fn can_record_contribution_for(&self, acting: Role, target: Role) -> bool {
        match acting {
            Role::Admin | Role::President => {
                self.ranks.contains_key(&acting) && self.ranks.contains_key(&target)
            }
            Role::VicePresident | Role::Treasurer | Role::SeniorExecutive => {
                self.outranks(acting, target)
            }
            Role::Member => false,
        }
    }

    /// Whether `acting` may schedule activities.
    pub fn can_create_activity(&self, acting: Role) -> bool {
        acting != Role::Member && self.ranks.contains_key(&acting)
    }

    /// The configured table as role names, for display and round-tripping.
    pub fn to_names(&self) -> BTreeMap<String, u8> {
        self.ranks
            .iter()
            .map(|(role, rank)| (role.to_string(), *rank))
            .collect()
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        let ranks = Role::ALL
            .into_iter()
            .enumerate()
            .map(|(rank, role)| (role, rank as u8))
            .collect();
        Self { ranks }
    }
}
