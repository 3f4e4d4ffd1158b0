//! Club storage abstractions.
//!
//! This crate defines the collaborator contracts the contribution ledger
//! calls through:
//! - member profiles, including the atomic points increment
//! - contribution records
//! - activities and their participants
//! - notification delivery
//! - the clock used for time-boxed edit/delete rights
//!
//! Design stance:
//! - Points are only ever changed through `increment_member_points`, which
//!   adds a delta and stores the recomputed level in one critical section.
//!   Callers never read-modify-write a balance.
//! - The in-memory adapter is the reference implementation; PostgreSQL is
//!   available behind the `postgres` feature.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod clock;
mod error;
pub mod memory;
mod model;
mod notify;
#[cfg(feature = "postgres")]
pub mod postgres;
mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StorageError, StorageResult};
pub use model::{ContributionRevision, ContributionUpdate, NewContribution};
pub use notify::{InMemoryNotificationSink, NotificationSink, TracingNotificationSink};
pub use traits::{ActivityStore, ClubStorage, ContributionStore, MemberStore, QueryWindow};
