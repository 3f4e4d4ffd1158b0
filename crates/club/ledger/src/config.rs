use crate::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ledger tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// How long after creation a non-admin may edit a contribution
    pub edit_window_secs: u64,
    /// How long after creation the recorder may delete a contribution
    pub delete_window_secs: u64,
    /// Upper bound on every repository / notification call
    pub collaborator_timeout_ms: u64,
    pub min_points: i64,
    pub max_points: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            edit_window_secs: 24 * 60 * 60,
            delete_window_secs: 60 * 60,
            collaborator_timeout_ms: 5_000,
            min_points: 1,
            max_points: 100,
        }
    }
}

impl LedgerConfig {
    pub fn edit_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.edit_window_secs.min(i64::MAX as u64) as i64)
    }

    pub fn delete_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.delete_window_secs.min(i64::MAX as u64) as i64)
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.min_points < 1 {
            return Err(LedgerError::Validation(format!(
                "min_points must be at least 1, got {}",
                self.min_points
            )));
        }
        if self.max_points < self.min_points {
            return Err(LedgerError::Validation(format!(
                "max_points ({}) is below min_points ({})",
                self.max_points, self.min_points
            )));
        }
        if self.collaborator_timeout_ms == 0 {
            return Err(LedgerError::Validation(
                "collaborator_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
