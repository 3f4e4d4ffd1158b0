//! Club Domain Types
//!
//! This crate defines the vocabulary shared by every club crate: who a
//! member is, which role they hold, how points translate into a level,
//! and what a contribution or activity looks like once persisted.
//!
//! # Key Concepts
//!
//! - **Role**: a closed set of authority roles. Ordering between roles is
//!   NOT derived here; it lives in the configurable rank table of
//!   `club-roles`.
//! - **Level**: a tier derived solely from a member's points through a
//!   [`LevelTable`].
//! - **Contribution**: an auditable grant of points from a recorder to a
//!   target member.
//!
//! # Architecture
//!
//! This is a pure types crate with no I/O. IDs use the newtype pattern and
//! implement `Display`, `generate()`, and `new()`.

#![deny(unsafe_code)]

mod activity;
mod contribution;
mod errors;
mod ids;
mod level;
mod member;
mod notification;
mod role;

pub use activity::*;
pub use contribution::*;
pub use errors::*;
pub use ids::*;
pub use level::*;
pub use member::*;
pub use notification::*;
pub use role::*;
