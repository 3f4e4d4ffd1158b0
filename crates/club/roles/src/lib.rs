//! Club Role Hierarchy
//!
//! Encodes the strict ranking of roles and the authorization predicates
//! derived from it. Everything here is pure: no I/O, no clocks, no storage.
//!
//! # Rules
//!
//! 1. A role may only manage roles ranked strictly below it, never a peer
//!    and never itself.
//! 2. `admin` may manage every role except `admin`.
//! 3. Only officer roles may record contributions; officers below
//!    president are bound by rule 1, president and admin are not.
//! 4. An actor is never their own target. This is checked by identity,
//!    not inferred from rank arithmetic.

#![deny(unsafe_code)]

mod authority;
mod hierarchy;

pub use authority::RoleDenial;
pub use hierarchy::{HierarchyError, HierarchyResult, RoleHierarchy};
