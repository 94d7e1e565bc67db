//! Course and enrollment counts

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::periods::{PeriodCount, PeriodQuery};
use crate::prelude::*;
use crate::scope::{CourseFilter, OrgCounter};
use insight_core::roles::RoleHolders;
use insight_types::course_query::CourseQuery;
use insight_types::learning_adapter::{Course, EnrollmentRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
	Active,
	Upcoming,
	Archived,
}

impl CourseStatus {
	/// Ended courses are archived even when their start is still ahead
	pub fn of(course: &Course, now: Timestamp) -> CourseStatus {
		match (course.start, course.end) {
			(_, Some(end)) if end < now => CourseStatus::Archived,
			(Some(start), _) if start > now => CourseStatus::Upcoming,
			_ => CourseStatus::Active,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
	pub status: CourseStatus,
	pub self_paced: bool,
	pub courses_count: u64,
}

/// Courses per org
pub async fn get_courses_count(
	app: &App,
	perm: &PermissionInfo,
	filter: CourseFilter,
) -> ClResult<BTreeMap<String, u64>> {
	let query = filter.query(perm);
	if query.is_empty() {
		return Ok(BTreeMap::new());
	}
	let mut counter = OrgCounter::default();
	for course in app.learning_adapter.list_courses(&query).await? {
		counter.add(&course.org, 1);
	}
	Ok(counter.into_map())
}

/// Courses by status and pacing, ordered by status then pacing
pub async fn get_courses_count_by_status(
	app: &App,
	perm: &PermissionInfo,
	filter: CourseFilter,
) -> ClResult<Vec<StatusCount>> {
	let query = filter.query(perm);
	if query.is_empty() {
		return Ok(Vec::new());
	}
	let mut counts: BTreeMap<(CourseStatus, bool), u64> = BTreeMap::new();
	for course in app.learning_adapter.list_courses(&query).await? {
		*counts.entry((CourseStatus::of(&course, query.now()), course.self_paced)).or_default() += 1;
	}
	Ok(counts
		.into_iter()
		.map(|((status, self_paced), courses_count)| StatusCount { status, self_paced, courses_count })
		.collect())
}

/// Active enrollments that count as learner enrollments.
///
/// Inactive accounts, platform staff and superusers never count. Unless
/// `include_staff` is set, users acting as staff of the course are left out too.
async fn counted_enrollments(
	app: &App,
	query: &CourseQuery,
	include_staff: bool,
) -> ClResult<Vec<EnrollmentRow>> {
	let enrollments = app.learning_adapter.list_enrollments(query).await?;
	let holders = if include_staff {
		RoleHolders::default()
	} else {
		RoleHolders::load(app, query.orgs()).await?
	};

	Ok(enrollments
		.into_iter()
		.filter(|row| row.is_active && row.user.is_plain_learner())
		.filter(|row| {
			OrgName::new(&row.org)
				.is_some_and(|org| include_staff || !holders.is_course_staff(row.user_id, &org, &row.course_id))
		})
		.collect())
}

/// Active enrollments per org
pub async fn get_enrollments_count(
	app: &App,
	perm: &PermissionInfo,
	filter: CourseFilter,
	include_staff: bool,
) -> ClResult<BTreeMap<String, u64>> {
	let query = filter.query(perm);
	if query.is_empty() {
		return Ok(BTreeMap::new());
	}
	let mut counter = OrgCounter::default();
	for row in counted_enrollments(app, &query, include_staff).await? {
		counter.add(&row.org, 1);
	}
	Ok(counter.into_map())
}

/// Enrollment counts per period with the range they cover
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSeries {
	/// Ordered by label, periods without enrollments are absent
	pub counts: Vec<PeriodCount>,
	pub date_from: Option<NaiveDate>,
	pub date_to: Option<NaiveDate>,
}

/// Active enrollments per creation period, counted like [`get_enrollments_count`]
pub async fn get_enrollments_count_aggregated(
	app: &App,
	perm: &PermissionInfo,
	filter: CourseFilter,
	include_staff: bool,
	periods: &PeriodQuery,
) -> ClResult<PeriodSeries> {
	let (date_from, date_to) = periods.resolve(Utc::now().date_naive());
	let mut res = PeriodSeries { counts: Vec::new(), date_from, date_to };
	let query = filter.query(perm);
	if query.is_empty() {
		return Ok(res);
	}

	let mut counts: BTreeMap<String, u64> = BTreeMap::new();
	for row in counted_enrollments(app, &query, include_staff).await? {
		let Some(created) = DateTime::from_timestamp(row.created.0, 0).map(|dt| dt.date_naive()) else {
			continue;
		};
		if date_from.is_some_and(|from| created < from) || date_to.is_some_and(|to| created > to) {
			continue;
		}
		*counts.entry(periods.period.label(created)).or_default() += 1;
	}
	res.counts = counts.into_iter().map(|(label, value)| PeriodCount { label, value }).collect();
	Ok(res)
}


// vim: ts=4
