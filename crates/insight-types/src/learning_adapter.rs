//! Adapter for the course, enrollment and certificate data store.
//!
//! Every query is scoped by a [`CourseQuery`]: implementations must return only
//! rows whose course matches it. Aggregation happens above the adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt::Debug;

use crate::course_query::CourseQuery;
use crate::prelude::*;
use crate::user_adapter::UserFlags;

pub const CERTIFICATE_DOWNLOADABLE: &str = "downloadable";

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Course {
	pub course_id: Box<str>,
	/// Org as recorded on the course
	pub org: Box<str>,
	pub display_name: Option<Box<str>>,
	pub start: Option<Timestamp>,
	pub end: Option<Timestamp>,
	pub self_paced: bool,
	pub catalog_visibility: Box<str>,
	pub visible_to_staff_only: bool,
	/// Declared effort, `HH:MM`
	pub effort: Option<Box<str>>,
	/// Downloadable certificates of active users, present when annotated
	pub certificates_count: Option<u64>,
	/// Active enrollments of active users, present when annotated
	pub enrollments_count: Option<u64>,
}

impl Course {
	pub fn org_name(&self) -> Option<OrgName> {
		OrgName::new(&self.org)
	}

	pub fn is_visible(&self) -> bool {
		matches!(&*self.catalog_visibility, "about" | "both") && !self.visible_to_staff_only
	}

	/// Within the start/end window, missing bounds are unbounded
	pub fn is_active_at(&self, now: Timestamp) -> bool {
		self.start.is_none_or(|start| start <= now) && self.end.is_none_or(|end| end >= now)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentRow {
	pub user_id: UserId,
	pub course_id: Box<str>,
	/// Org as recorded on the course
	pub org: Box<str>,
	pub is_active: bool,
	pub user: UserFlags,
	pub created: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRow {
	pub user_id: UserId,
	pub course_id: Box<str>,
	/// Org as recorded on the course
	pub org: Box<str>,
	pub status: Box<str>,
	pub user: UserFlags,
}

/// Feedback count of one course at one rating value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingRow {
	pub course_id: Box<str>,
	/// Org as recorded on the course
	pub org: Box<str>,
	pub rating: u32,
	pub count: u64,
}

#[async_trait]
pub trait LearningAdapter: Debug + Send + Sync {
	/// Courses matching the query, ordered by course ID
	async fn list_courses(&self, query: &CourseQuery) -> ClResult<Vec<Course>>;

	/// Enrollments (active and inactive) in courses matching the query
	async fn list_enrollments(&self, query: &CourseQuery) -> ClResult<Vec<EnrollmentRow>>;

	/// Certificates with the given status in courses matching the query
	async fn list_certificates(
		&self,
		query: &CourseQuery,
		status: &str,
	) -> ClResult<Vec<CertificateRow>>;

	/// Course feedback grouped by course and rating value. Unrated feedback
	/// (rating 0) is left out.
	async fn list_course_ratings(&self, query: &CourseQuery) -> ClResult<Vec<RatingRow>>;
}

// vim: ts=4
