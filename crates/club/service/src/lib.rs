//! Club Services
//!
//! Application services layered over the contribution ledger:
//! - [`ClubConfig`]: TOML configuration for the hierarchy, level table and
//!   ledger windows
//! - [`MembershipService`]: profile bootstrap, role changes, member removal
//! - [`ActivityService`]: scheduling and capacity-checked registration
//! - [`Leaderboard`] and [`Analytics`]: read-only projections
//! - [`Club`]: everything wired against one storage backend

#![deny(unsafe_code)]

pub mod activities;
pub mod analytics;
mod club;
pub mod config;
mod error;
pub mod leaderboard;
pub mod membership;
pub mod telemetry;

pub use activities::ActivityService;
pub use analytics::{Analytics, RolePerformance, TypeBreakdown};
pub use club::Club;
pub use config::{ClubConfig, ConfigError, ConfigResult, HierarchyConfig, LevelsConfig};
pub use error::{ServiceError, ServiceResult};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use membership::MembershipService;
pub use telemetry::init_tracing;
