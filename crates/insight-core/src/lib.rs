//! Core of the Insight engine.
//!
//! Tenant registry, role resolution, permission scopes and the shared result
//! cache. Statistics crates build on the [`permission::PermissionInfo`]
//! produced here.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod cache;
pub mod extract;
pub mod permission;
pub mod prelude;
pub mod roles;
pub mod settings;
pub mod tenants;
pub mod users;

#[cfg(test)]
mod mock;

pub use app::{App, AppBuilder, AppState};
pub use extract::Auth;

// vim: ts=4
