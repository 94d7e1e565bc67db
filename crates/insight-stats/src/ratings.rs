//! Course ratings from learner feedback
//!
//! Ratings of one tenant are computed over the whole tenant and cached per
//! tenant and course filter. Scopes narrower than a tenant are computed on
//! every request.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use crate::prelude::*;
use crate::scope::CourseFilter;
use insight_core::cache::{CacheMode, KEY_PREFIX_COURSES_RATINGS};
use insight_core::permission::build_fx_permission_info;

/// Star levels with their own counter
pub const RATING_RANGE: RangeInclusive<u32> = 1..=5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursesRatings {
	/// Sum of every rating given
	pub total_rating: u64,
	/// Courses with at least one rating
	pub courses_count: u64,
	pub rating_1_count: u64,
	pub rating_2_count: u64,
	pub rating_3_count: u64,
	pub rating_4_count: u64,
	pub rating_5_count: u64,
}

impl CoursesRatings {
	pub fn count_of(&self, rating: u32) -> u64 {
		match rating {
			1 => self.rating_1_count,
			2 => self.rating_2_count,
			3 => self.rating_3_count,
			4 => self.rating_4_count,
			5 => self.rating_5_count,
			_ => 0,
		}
	}

	fn add_level(&mut self, rating: u32, count: u64) {
		let slot = match rating {
			1 => &mut self.rating_1_count,
			2 => &mut self.rating_2_count,
			3 => &mut self.rating_3_count,
			4 => &mut self.rating_4_count,
			5 => &mut self.rating_5_count,
			_ => return,
		};
		*slot += count;
	}

	/// Ratings counted in the star levels
	pub fn total_count(&self) -> u64 {
		RATING_RANGE.map(|rating| self.count_of(rating)).sum()
	}

	fn merge(&mut self, other: &CoursesRatings) {
		self.total_rating += other.total_rating;
		self.courses_count += other.courses_count;
		for rating in RATING_RANGE {
			self.add_level(rating, other.count_of(rating));
		}
	}
}

async fn compute_ratings(app: &App, perm: &PermissionInfo, filter: CourseFilter) -> ClResult<CoursesRatings> {
	let mut res = CoursesRatings::default();
	let query = filter.query(perm);
	if query.is_empty() {
		return Ok(res);
	}

	let mut courses = BTreeSet::new();
	for row in app.learning_adapter.list_course_ratings(&query).await? {
		if row.rating == 0 || row.count == 0 {
			continue;
		}
		res.total_rating += u64::from(row.rating) * row.count;
		res.add_level(row.rating, row.count);
		courses.insert(row.course_id);
	}
	res.courses_count = u64::try_from(courses.len()).unwrap_or_default();
	Ok(res)
}

fn cache_key(tn_id: TnId, filter: CourseFilter) -> String {
	format!("{}t{}_v{:?}_a{:?}", KEY_PREFIX_COURSES_RATINGS, tn_id, filter.visible, filter.active)
}

/// Ratings of every course of one tenant, cached per tenant
pub async fn get_courses_ratings(
	app: &App,
	tn_id: TnId,
	filter: CourseFilter,
	mode: CacheMode,
) -> ClResult<CoursesRatings> {
	let key = cache_key(tn_id, filter);
	app.cache
		.cached(&key, app.settings.cache_timeout_courses_ratings, mode, || async move {
			let perm = build_fx_permission_info(app, &[tn_id]).await?;
			compute_ratings(app, &perm, filter).await
		})
		.await
}

/// Ratings summed over the tenants of a scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalRating {
	pub total_rating: u64,
	pub total_count: u64,
	pub courses_count: u64,
	/// `"1"` to `"5"`
	pub rating_counts: BTreeMap<String, u64>,
}

impl From<CoursesRatings> for GlobalRating {
	fn from(ratings: CoursesRatings) -> Self {
		GlobalRating {
			total_rating: ratings.total_rating,
			total_count: ratings.total_count(),
			courses_count: ratings.courses_count,
			rating_counts: RATING_RANGE.map(|rating| (rating.to_string(), ratings.count_of(rating))).collect(),
		}
	}
}

/// Ratings over the visible courses of a scope. Tenants reachable only through
/// course-level roles are computed over the reachable courses alone.
pub async fn get_global_rating(app: &App, perm: &PermissionInfo, mode: CacheMode) -> ClResult<GlobalRating> {
	let filter = CourseFilter::default();
	let mut res = CoursesRatings::default();
	for tn_id in &perm.tenant_ids_any_access {
		let ratings = if perm.is_full_access_tenant(*tn_id) {
			get_courses_ratings(app, *tn_id, filter, mode).await?
		} else {
			compute_ratings(app, &perm.limit_to_tenant(*tn_id), filter).await?
		};
		res.merge(&ratings);
	}
	debug!(tenants = perm.tenant_ids_any_access.len(), courses = res.courses_count, "global rating computed");
	Ok(res.into())
}


// vim: ts=4
