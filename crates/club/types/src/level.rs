//! Membership levels derived from points.
//!
//! A level is never stored independently of points: whoever mutates a
//! member's points must recompute the level through the same
//! [`LevelTable`] in the same step.

use crate::{TypesError, TypesResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Membership tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Level {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Bronze, Level::Silver, Level::Gold, Level::Platinum];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Bronze => "Bronze",
            Level::Silver => "Silver",
            Level::Gold => "Gold",
            Level::Platinum => "Platinum",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = TypesError;

    fn from_str(s: &str) -> TypesResult<Self> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypesError::UnknownLevel(s.to_string()))
    }
}

/// One row of a level table: the minimum points needed to reach `level`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTier {
    pub level: Level,
    pub min_points: i64,
}

impl LevelTier {
    pub fn new(level: Level, min_points: i64) -> Self {
        Self { level, min_points }
    }
}

/// Threshold table mapping points to a [`Level`].
///
/// Invariants enforced by [`LevelTable::new`]:
/// - at least one tier, and the first tier starts at 0 points
/// - `min_points` strictly increasing
/// - no level appears twice
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LevelTable {
    tiers: Vec<LevelTier>,
}

impl LevelTable {
    pub fn new(tiers: Vec<LevelTier>) -> TypesResult<Self> {
        let first = tiers
            .first()
            .ok_or_else(|| TypesError::InvalidLevelTable("table has no tiers".into()))?;
        if first.min_points != 0 {
            return Err(TypesError::InvalidLevelTable(format!(
                "first tier {} must start at 0 points, found {}",
                first.level, first.min_points
            )));
        }

        for pair in tiers.windows(2) {
            if pair[1].min_points <= pair[0].min_points {
                return Err(TypesError::InvalidLevelTable(format!(
                    "tier {} ({}) must start above tier {} ({})",
                    pair[1].level, pair[1].min_points, pair[0].level, pair[0].min_points
                )));
            }
        }

        for (index, tier) in tiers.iter().enumerate() {
            if tiers[..index].iter().any(|t| t.level == tier.level) {
                return Err(TypesError::InvalidLevelTable(format!(
                    "level {} appears more than once",
                    tier.level
                )));
            }
        }

        Ok(Self { tiers })
    }

    /// Level for a points balance. Balances below zero map to the first tier.
    pub fn level_of(&self, points: i64) -> Level {
        self.tiers
            .iter()
            .rev()
            .find(|tier| points >= tier.min_points)
            .or_else(|| self.tiers.first())
            .map(|tier| tier.level)
            .unwrap_or_default()
    }

    /// Points still needed to reach the next tier, if any.
    pub fn points_to_next(&self, points: i64) -> Option<(Level, i64)> {
        self.tiers
            .iter()
            .find(|tier| tier.min_points > points)
            .map(|tier| (tier.level, tier.min_points - points))
    }

    pub fn tiers(&self) -> &[LevelTier] {
        &self.tiers
    }
}

impl Default for LevelTable {
    /// Bronze 0-49, Silver 50-99, Gold 100-199, Platinum 200+.
    fn default() -> Self {
        Self {
            tiers: vec![
                LevelTier::new(Level::Bronze, 0),
                LevelTier::new(Level::Silver, 50),
                LevelTier::new(Level::Gold, 100),
                LevelTier::new(Level::Platinum, 200),
            ],
        }
    }
}

impl<'de> Deserialize<'de> for LevelTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            tiers: Vec<LevelTier>,
        }

        let raw = Raw::deserialize(deserializer)?;
        LevelTable::new(raw.tiers).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_table_boundaries() {
        let table = LevelTable::default();
        assert_eq!(table.level_of(0), Level::Bronze);
        assert_eq!(table.level_of(49), Level::Bronze);
        assert_eq!(table.level_of(50), Level::Silver);
        assert_eq!(table.level_of(99), Level::Silver);
        assert_eq!(table.level_of(100), Level::Gold);
        assert_eq!(table.level_of(199), Level::Gold);
        assert_eq!(table.level_of(200), Level::Platinum);
        assert_eq!(table.level_of(10_000), Level::Platinum);
    }

    #[test]
    fn negative_points_fall_back_to_first_tier() {
        assert_eq!(LevelTable::default().level_of(-5), Level::Bronze);
    }

    #[test]
    fn three_tier_table_is_supported() {
        let table = LevelTable::new(vec![
            LevelTier::new(Level::Bronze, 0),
            LevelTier::new(Level::Silver, 50),
            LevelTier::new(Level::Gold, 100),
        ])
        .unwrap();
        assert_eq!(table.level_of(450), Level::Gold);
    }

    #[test]
    fn rejects_tables_not_starting_at_zero() {
        let result = LevelTable::new(vec![LevelTier::new(Level::Bronze, 10)]);
        assert!(matches!(result, Err(TypesError::InvalidLevelTable(_))));
    }

    #[test]
    fn rejects_non_increasing_thresholds() {
        let result = LevelTable::new(vec![
            LevelTier::new(Level::Bronze, 0),
            LevelTier::new(Level::Silver, 50),
            LevelTier::new(Level::Gold, 50),
        ]);
        assert!(matches!(result, Err(TypesError::InvalidLevelTable(_))));
    }

    #[test]
    fn rejects_duplicate_levels() {
        let result = LevelTable::new(vec![
            LevelTier::new(Level::Bronze, 0),
            LevelTier::new(Level::Bronze, 50),
        ]);
        assert!(matches!(result, Err(TypesError::InvalidLevelTable(_))));
    }

    #[test]
    fn rejects_empty_table() {
        assert!(LevelTable::new(vec![]).is_err());
    }

    #[test]
    fn points_to_next_tier() {
        let table = LevelTable::default();
        assert_eq!(table.points_to_next(80), Some((Level::Gold, 20)));
        assert_eq!(table.points_to_next(250), None);
    }

    #[test]
    fn deserialization_validates() {
        let ok: LevelTable = serde_json::from_str(
            r#"{"tiers":[{"level":"Bronze","min_points":0},{"level":"Gold","min_points":10}]}"#,
        )
        .unwrap();
        assert_eq!(ok.level_of(12), Level::Gold);

        let bad = serde_json::from_str::<LevelTable>(
            r#"{"tiers":[{"level":"Bronze","min_points":5}]}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("gold".parse::<Level>().unwrap(), Level::Gold);
        assert!("diamond".parse::<Level>().is_err());
    }

    proptest! {
        #[test]
        fn level_is_monotonic_in_points(a in 0i64..1_000, b in 0i64..1_000) {
            let table = LevelTable::default();
            let rank = |level: Level| Level::ALL.iter().position(|l| *l == level).unwrap();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(rank(table.level_of(lo)) <= rank(table.level_of(hi)));
        }
    }
}
