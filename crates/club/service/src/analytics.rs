//! Aggregate views over members and contributions.

use club_types::{Contribution, ContributionType, Member, MemberId, Role};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeBreakdown {
    pub contribution_type: ContributionType,
    pub count: usize,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RolePerformance {
    pub role: Role,
    pub members: usize,
    pub total_points: i64,
    /// Rounded to the nearest integer
    pub average_points: i64,
    pub average_contributions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub total_members: usize,
    pub total_contributions: usize,
    pub total_points_awarded: i64,
    /// Only types that occur, in declaration order
    pub by_type: Vec<TypeBreakdown>,
    /// Only roles that are held, in rank order of the default table
    pub by_role: Vec<RolePerformance>,
}

impl Analytics {
    pub fn compute(members: &[Member], contributions: &[Contribution]) -> Self {
        let by_type = ContributionType::ALL
            .into_iter()
            .filter_map(|ty| {
                let matching = contributions.iter().filter(|c| c.contribution_type == ty);
                let (count, points) = matching.fold((0usize, 0i64), |(n, p), c| (n + 1, p + c.points));
                (count > 0).then_some(TypeBreakdown {
                    contribution_type: ty,
                    count,
                    points,
                })
            })
            .collect();

        let mut received: HashMap<&MemberId, usize> = HashMap::new();
        for contribution in contributions {
            *received.entry(&contribution.member_id).or_default() += 1;
        }

        let by_role = Role::ALL
            .into_iter()
            .filter_map(|role| {
                let holders = members.iter().filter(|m| m.role == role).collect::<Vec<_>>();
                if holders.is_empty() {
                    return None;
                }
                let count = holders.len();
                let total_points: i64 = holders.iter().map(|m| m.points).sum();
                let total_received: usize = holders
                    .iter()
                    .map(|m| received.get(&m.id).copied().unwrap_or(0))
                    .sum();
                Some(RolePerformance {
                    role,
                    members: count,
                    total_points,
                    average_points: (total_points as f64 / count as f64).round() as i64,
                    average_contributions: total_received as f64 / count as f64,
                })
            })
            .collect();

        Self {
            total_members: members.len(),
            total_contributions: contributions.len(),
            total_points_awarded: contributions.iter().map(|c| c.points).sum(),
            by_type,
            by_role,
        }
    }
}
