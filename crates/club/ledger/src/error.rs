use club_roles::{HierarchyError, RoleDenial};
use club_storage::StorageError;
use club_types::{ContributionId, MemberId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Coarse classification callers use to decide between retry and abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Forbidden,
    NotFound,
    Expired,
    Unavailable,
    PartialFailure,
}

/// Ledger mutations. Edit and delete are time-boxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    Create,
    Edit,
    Delete,
}

impl LedgerAction {
    pub fn past_tense(&self) -> &'static str {
        match self {
            LedgerAction::Create => "recorded",
            LedgerAction::Edit => "edited",
            LedgerAction::Delete => "deleted",
        }
    }
}

impl std::fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerAction::Create => f.write_str("create"),
            LedgerAction::Edit => f.write_str("edit"),
            LedgerAction::Delete => f.write_str("delete"),
        }
    }
}

/// Ledger errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid contribution: {0}")]
    Validation(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("the {window} {action} window for this contribution has expired")]
    Expired { action: LedgerAction, window: String },

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error(
        "contribution {contribution_id} was {} but points for member {member_id} were not applied: {reason}",
        .action.past_tense()
    )]
    PartialFailure {
        action: LedgerAction,
        contribution_id: ContributionId,
        member_id: MemberId,
        reason: String,
    },

    #[error("unknown role: {0}")]
    UnknownRole(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) | LedgerError::UnknownRole(_) => ErrorKind::Validation,
            LedgerError::Forbidden(_) => ErrorKind::Forbidden,
            LedgerError::NotFound(_) => ErrorKind::NotFound,
            LedgerError::Expired { .. } => ErrorKind::Expired,
            LedgerError::Unavailable(_) => ErrorKind::Unavailable,
            LedgerError::PartialFailure { .. } => ErrorKind::PartialFailure,
        }
    }

    /// Only collaborator outages are worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Unavailable
    }

    pub(crate) fn expired(action: LedgerAction, window: chrono::Duration) -> Self {
        LedgerError::Expired {
            action,
            window: describe_window(window),
        }
    }
}

impl From<StorageError> for LedgerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => LedgerError::NotFound(what),
            StorageError::InvalidInput(what) => LedgerError::Validation(what),
            other => LedgerError::Unavailable(other.to_string()),
        }
    }
}

impl From<HierarchyError> for LedgerError {
    fn from(err: HierarchyError) -> Self {
        match err {
            HierarchyError::UnknownRole(role) => LedgerError::UnknownRole(role),
            other => LedgerError::Validation(other.to_string()),
        }
    }
}

impl From<RoleDenial> for LedgerError {
    fn from(denial: RoleDenial) -> Self {
        LedgerError::Forbidden(denial.to_string())
    }
}

/// Human form of a window: `24h`, `1h`, `90m`, `45s`.
pub fn describe_window(window: chrono::Duration) -> String {
    let secs = window.num_seconds();
    if secs != 0 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs != 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn windows_render_in_largest_whole_unit() {
        assert_eq!(describe_window(Duration::hours(24)), "24h");
        assert_eq!(describe_window(Duration::hours(1)), "1h");
        assert_eq!(describe_window(Duration::minutes(90)), "90m");
        assert_eq!(describe_window(Duration::seconds(45)), "45s");
    }

    #[test]
    fn expired_message_names_the_window() {
        let err = LedgerError::expired(LedgerAction::Edit, Duration::hours(24));
        assert_eq!(
            err.to_string(),
            "the 24h edit window for this contribution has expired"
        );
        assert_eq!(err.kind(), ErrorKind::Expired);
    }

    #[test]
    fn partial_failure_names_the_action() {
        let err = LedgerError::PartialFailure {
            action: LedgerAction::Delete,
            contribution_id: ContributionId::new("c-1"),
            member_id: MemberId::new("ada"),
            reason: "timeout".into(),
        };
        assert_eq!(
            err.to_string(),
            "contribution c-1 was deleted but points for member ada were not applied: timeout"
        );
        assert_eq!(err.kind(), ErrorKind::PartialFailure);
    }

    #[test]
    fn storage_errors_translate() {
        assert_eq!(
            LedgerError::from(StorageError::NotFound("member x".into())).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            LedgerError::from(StorageError::InvalidInput("empty".into())).kind(),
            ErrorKind::Validation
        );
        let outage = LedgerError::from(StorageError::Backend("connection reset".into()));
        assert_eq!(outage.kind(), ErrorKind::Unavailable);
        assert!(outage.is_retryable());
    }

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(!LedgerError::Forbidden("no".into()).is_retryable());
        assert!(!LedgerError::PartialFailure {
            action: LedgerAction::Create,
            contribution_id: ContributionId::new("c"),
            member_id: MemberId::new("m"),
            reason: "down".into(),
        }
        .is_retryable());
    }
}
