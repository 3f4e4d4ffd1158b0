//! Error types for the club domain layer

/// Errors raised while parsing or constructing domain values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown level: {0}")]
    UnknownLevel(String),

    #[error("Unknown contribution type: {0}")]
    UnknownContributionType(String),

    #[error("Unknown activity type: {0}")]
    UnknownActivityType(String),

    #[error("Invalid level table: {0}")]
    InvalidLevelTable(String),
}

/// Result type alias for domain-level operations
pub type TypesResult<T> = Result<T, TypesError>;
