//! Contribution Ledger
//!
//! Creates, edits and deletes contribution records while keeping each
//! target member's points and level consistent with them.
//!
//! # Guarantees
//!
//! - Points only move through the repository's atomic increment, which
//!   stores the recomputed level in the same step. The ledger never reads a
//!   balance and writes it back. Edits and deletes take their delta from
//!   the value the store replaced or removed.
//! - A contribution persisted without its points applied is reported as
//!   [`LedgerError::PartialFailure`]; [`ContributionLedger::reconcile_member`]
//!   re-derives the balance from the stored contributions.
//! - Every collaborator call is bounded by
//!   [`LedgerConfig::collaborator_timeout`] and surfaces
//!   [`LedgerError::Unavailable`] on expiry.
//! - Notifications run on a detached task. Failures and timeouts are logged
//!   and never delay or fail the operation.

#![deny(unsafe_code)]

mod config;
mod error;
mod ledger;
mod reconcile;

pub use config::LedgerConfig;
pub use error::{describe_window, ErrorKind, LedgerAction, LedgerError, LedgerResult};
pub use ledger::ContributionLedger;
pub use reconcile::Reconciliation;
