//! Statistics of the Insight engine.
//!
//! Read-only aggregators over a [`PermissionInfo`](insight_core::permission::PermissionInfo)
//! scope, the total and per-period count composers, course ratings, live
//! statistics, the learners listing and the axum handlers exposing them.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod aggregated_counts;
pub mod certificates;
pub mod courses;
pub mod handler;
pub mod learners;
pub mod listing;
pub mod live;
pub mod periods;
pub mod prelude;
pub mod ratings;
pub mod scope;
pub mod total_counts;

#[cfg(test)]
mod testing;

// vim: ts=4
