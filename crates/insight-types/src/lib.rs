//! Shared types, adapter traits, and core utilities for the Insight engine.
//!
//! Adapter crates depend only on this crate, so storage backends compile
//! independently from the permission and statistics logic.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod codes;
pub mod course_query;
pub mod error;
pub mod learning_adapter;
pub mod prelude;
pub mod release;
pub mod role_adapter;
pub mod tenant_adapter;
pub mod types;
pub mod user_adapter;
pub mod utils;

// vim: ts=4
