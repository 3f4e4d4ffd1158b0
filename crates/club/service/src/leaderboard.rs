//! Leaderboard projection.

use club_types::{Contribution, Level, Member, MemberId, Role};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based
    pub rank: usize,
    pub member_id: MemberId,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub points: i64,
    pub level: Level,
    /// Contributions received
    pub contributions: usize,
}

/// Members ranked by points, ties broken by username.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn build(members: &[Member], contributions: &[Contribution]) -> Self {
        let mut counts: HashMap<&MemberId, usize> = HashMap::new();
        for contribution in contributions {
            *counts.entry(&contribution.member_id).or_default() += 1;
        }

        let mut ranked = members.iter().collect::<Vec<_>>();
        ranked.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.username.cmp(&b.username))
        });

        let entries = ranked
            .into_iter()
            .enumerate()
            .map(|(index, member)| LeaderboardEntry {
                rank: index + 1,
                member_id: member.id.clone(),
                username: member.username.clone(),
                display_name: member.display_name().to_string(),
                role: member.role,
                points: member.points,
                level: member.level,
                contributions: counts.get(&member.id).copied().unwrap_or(0),
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Top three.
    pub fn podium(&self) -> &[LeaderboardEntry] {
        &self.entries[..self.entries.len().min(3)]
    }

    pub fn position_of(&self, member_id: &MemberId) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| &e.member_id == member_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_points(&self) -> i64 {
        self.entries.iter().map(|e| e.points).sum()
    }

    /// Mean points, rounded to the nearest integer. Zero for an empty board.
    pub fn average_points(&self) -> i64 {
        if self.entries.is_empty() {
            return 0;
        }
        (self.total_points() as f64 / self.entries.len() as f64).round() as i64
    }

    pub fn highest_points(&self) -> i64 {
        self.entries.first().map(|e| e.points).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use club_types::{ContributionId, ContributionType, LevelTable};

    fn member(name: &str, points: i64) -> Member {
        let levels = LevelTable::default();
        Member::new(MemberId::new(name), name, &levels).with_points(points, &levels)
    }

    fn contribution(member_id: &str) -> Contribution {
        let now = Utc::now();
        Contribution {
            id: ContributionId::generate(),
            member_id: MemberId::new(member_id),
            recorded_by: MemberId::new("pres"),
            description: "help".to_string(),
            points: 10,
            contribution_type: ContributionType::Participation,
            activity_id: None,
            idempotency_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn ranks_by_points_then_username() {
        let members = vec![
            member("cy", 40),
            member("bob", 120),
            member("ada", 40),
            member("dee", 5),
        ];
        let board = Leaderboard::build(&members, &[contribution("ada"), contribution("ada")]);

        let order = board
            .entries()
            .iter()
            .map(|e| (e.rank, e.username.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![(1, "bob"), (2, "ada"), (3, "cy"), (4, "dee")]);
        assert_eq!(board.position_of(&MemberId::new("ada")).unwrap().contributions, 2);
        assert_eq!(board.podium().len(), 3);
        assert_eq!(board.podium()[0].level, Level::Gold);
    }

    #[test]
    fn totals_and_rounded_average() {
        let members = vec![member("ada", 10), member("bob", 15), member("cy", 0)];
        let board = Leaderboard::build(&members, &[]);
        assert_eq!(board.total_points(), 25);
        // 8.33 rounds down
        assert_eq!(board.average_points(), 8);
        assert_eq!(board.highest_points(), 15);
    }

    #[test]
    fn empty_board() {
        let board = Leaderboard::build(&[], &[]);
        assert!(board.is_empty());
        assert!(board.podium().is_empty());
        assert_eq!(board.average_points(), 0);
        assert_eq!(board.highest_points(), 0);
    }
}
