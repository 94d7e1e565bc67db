//! Certificate counts and learning hours
//!
//! Only downloadable certificates of active accounts count. Platform staff and
//! superusers keep their certificates; course staff are dropped unless
//! `include_staff` is set.

use std::collections::{BTreeMap, HashMap};

use crate::prelude::*;
use crate::scope::{CourseFilter, OrgCounter};
use insight_core::roles::RoleHolders;
use insight_types::course_query::{Annotation, CourseQuery};
use insight_types::learning_adapter::{CERTIFICATE_DOWNLOADABLE, CertificateRow};

const MIN_COURSE_EFFORT: f64 = 0.5;

async fn downloadable_certificates(
	app: &App,
	query: &CourseQuery,
	include_staff: bool,
) -> ClResult<Vec<CertificateRow>> {
	let rows = app.learning_adapter.list_certificates(query, CERTIFICATE_DOWNLOADABLE).await?;
	let holders = if include_staff {
		RoleHolders::default()
	} else {
		RoleHolders::load(app, query.orgs()).await?
	};
	Ok(rows
		.into_iter()
		.filter(|row| row.user.is_active)
		.filter(|row| {
			include_staff
				|| OrgName::new(&row.org)
					.is_some_and(|org| !holders.is_course_staff(row.user_id, &org, &row.course_id))
		})
		.collect())
}

/// Certificates per org, keyed by the org as recorded on the course
pub async fn get_certificates_count(
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
	for row in downloadable_certificates(app, &query, include_staff).await? {
		counter.add(&row.org, 1);
	}
	Ok(counter.into_map())
}

/// Hours of a course effort given as `HH` or `HH:MM`, rounded to one decimal.
/// Missing, malformed or too small values fall back to `default`.
pub fn parse_course_effort(effort: Option<&str>, course_id: &str, default: f64) -> f64 {
	let Some(effort) = effort.map(str::trim).filter(|e| !e.is_empty()) else {
		return default;
	};
	let parsed = (|| {
		let mut parts = effort.split(':');
		let hours: u32 = parts.next()?.trim().parse().ok()?;
		let minutes: u32 = match parts.next() {
			Some(m) => m.trim().parse().ok()?,
			None => 0,
		};
		if minutes >= 60 {
			return None;
		}
		let total = f64::from(hours) + f64::from(minutes) / 60.0;
		(total >= MIN_COURSE_EFFORT).then_some(total)
	})();

	match parsed {
		Some(hours) => round1(hours),
		None => {
			error!(course_id, effort, default, "invalid course effort, using default");
			default
		}
	}
}

fn round1(value: f64) -> f64 {
	(value * 10.0).round() / 10.0
}

/// Sum of course effort times certificates earned in the course
pub async fn get_learning_hours_count(
	app: &App,
	perm: &PermissionInfo,
	filter: CourseFilter,
	include_staff: bool,
) -> ClResult<f64> {
	let query = filter.query(perm).annotate_removable(Annotation::CertificatesCount);
	if query.is_empty() {
		return Ok(0.0);
	}
	let default = app.settings.default_course_effort;

	let hours = if include_staff {
		// the annotated count already covers every active account
		app.learning_adapter
			.list_courses(&query)
			.await?
			.iter()
			.map(|course| {
				let certificates = course.certificates_count.unwrap_or_default();
				parse_course_effort(course.effort.as_deref(), &course.course_id, default) * certificates as f64
			})
			.sum()
	} else {
		let query = query.strip_removable();
		let mut per_course: HashMap<Box<str>, u64> = HashMap::new();
		for row in downloadable_certificates(app, &query, false).await? {
			*per_course.entry(row.course_id).or_default() += 1;
		}
		app.learning_adapter
			.list_courses(&query)
			.await?
			.iter()
			.filter_map(|course| per_course.get(&course.course_id).map(|n| (course, *n)))
			.map(|(course, n)| parse_course_effort(course.effort.as_deref(), &course.course_id, default) * n as f64)
			.sum()
	};
	Ok(round1(hours))
}


// vim: ts=4
