//! Club configuration

use club_ledger::LedgerConfig;
use club_roles::{HierarchyError, RoleHierarchy};
use club_types::{LevelTable, LevelTier, TypesError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to render config: {0}")]
    Render(String),

    #[error("invalid [hierarchy] section: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("invalid [levels] section: {0}")]
    Levels(#[from] TypesError),

    #[error("invalid [ledger] section: {0}")]
    Ledger(String),
}

/// Top-level configuration, one section per concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClubConfig {
    pub hierarchy: HierarchyConfig,
    pub levels: LevelsConfig,
    pub ledger: LedgerConfig,
}

/// Role rank table, keyed by role name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    pub ranks: BTreeMap<String, u8>,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            ranks: RoleHierarchy::default().to_names(),
        }
    }
}

/// Level thresholds, lowest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    pub tiers: Vec<LevelTier>,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            tiers: LevelTable::default().tiers().to_vec(),
        }
    }
}

impl ClubConfig {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Render(e.to_string()))
    }

    pub fn role_hierarchy(&self) -> ConfigResult<RoleHierarchy> {
        Ok(RoleHierarchy::from_names(&self.hierarchy.ranks)?)
    }

    pub fn level_table(&self) -> ConfigResult<LevelTable> {
        Ok(LevelTable::new(self.levels.tiers.clone())?)
    }

    /// Check every section, reporting the first problem found.
    pub fn validate(&self) -> ConfigResult<()> {
        self.role_hierarchy()?;
        self.level_table()?;
        self.ledger
            .validate()
            .map_err(|e| ConfigError::Ledger(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use club_types::{Level, Role};
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ClubConfig::default();
        config.validate().unwrap();
        assert_eq!(config.role_hierarchy().unwrap(), RoleHierarchy::default());
        assert_eq!(config.level_table().unwrap(), LevelTable::default());
        assert_eq!(config.ledger.max_points, 100);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = ClubConfig::load(Path::new("/nonexistent/club/config.toml")).unwrap();
        assert_eq!(config, ClubConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[ledger]
edit_window_secs = 7200
"#
        )
        .unwrap();

        let config = ClubConfig::load(file.path()).unwrap();
        assert_eq!(config.ledger.edit_window_secs, 7200);
        assert_eq!(config.ledger.delete_window_secs, 3600);
        assert_eq!(config.hierarchy, HierarchyConfig::default());
    }

    #[test]
    fn custom_hierarchy_and_levels() {
        let config = ClubConfig::from_toml_str(
            r#"
[hierarchy.ranks]
member = 0
treasurer = 1
vice_president = 2
president = 3

[[levels.tiers]]
level = "Bronze"
min_points = 0

[[levels.tiers]]
level = "Gold"
min_points = 500
"#,
        )
        .unwrap();
        config.validate().unwrap();

        let hierarchy = config.role_hierarchy().unwrap();
        assert_eq!(hierarchy.rank_of(Role::VicePresident).unwrap(), 2);
        assert!(hierarchy.rank_of(Role::Admin).is_err());

        let levels = config.level_table().unwrap();
        assert_eq!(levels.level_of(499), Level::Bronze);
        assert_eq!(levels.level_of(500), Level::Gold);
    }

    #[test]
    fn unknown_role_name_is_reported() {
        let config = ClubConfig::from_toml_str(
            r#"
[hierarchy.ranks]
member = 0
chancellor = 1
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Hierarchy(HierarchyError::UnknownRole(ref name)) if name == "chancellor"
        ));
    }

    #[test]
    fn duplicate_ranks_are_reported() {
        let config = ClubConfig::from_toml_str(
            r#"
[hierarchy.ranks]
member = 0
treasurer = 1
senior_executive = 1
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Hierarchy(HierarchyError::DuplicateRank { .. }))
        ));
    }

    #[test]
    fn level_table_must_start_at_zero() {
        let config = ClubConfig::from_toml_str(
            r#"
[[levels.tiers]]
level = "Bronze"
min_points = 10
"#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Levels(_))));
    }

    #[test]
    fn rendered_config_parses_back() {
        let config = ClubConfig::default();
        let rendered = config.to_toml_string().unwrap();
        assert!(rendered.contains("[ledger]"));
        assert_eq!(ClubConfig::from_toml_str(&rendered).unwrap(), config);
    }
}
