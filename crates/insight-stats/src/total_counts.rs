//! Total counts over a permission scope
//!
//! Every requested stat is computed per tenant and summed into a
//! `total_<stat>_count` entry. Per-tenant values are cached under the
//! statistics prefix, keyed by the tenant's scope digest.

use itertools::Itertools;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

use crate::certificates;
use crate::courses;
use crate::learners;
use crate::prelude::*;
use crate::scope::CourseFilter;
use insight_core::cache::{CacheMode, KEY_PREFIX_STATISTICS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatKind {
	Certificates,
	Courses,
	Enrollments,
	HiddenCourses,
	Learners,
	LearningHours,
	UniqueLearners,
}

impl StatKind {
	pub const ALL: [StatKind; 7] = [
		StatKind::Certificates,
		StatKind::Courses,
		StatKind::Enrollments,
		StatKind::HiddenCourses,
		StatKind::Learners,
		StatKind::LearningHours,
		StatKind::UniqueLearners,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			StatKind::Certificates => "certificates",
			StatKind::Courses => "courses",
			StatKind::Enrollments => "enrollments",
			StatKind::HiddenCourses => "hidden_courses",
			StatKind::Learners => "learners",
			StatKind::LearningHours => "learning_hours",
			StatKind::UniqueLearners => "unique_learners",
		}
	}

	pub fn result_key(self) -> &'static str {
		match self {
			StatKind::Certificates => "certificates_count",
			StatKind::Courses => "courses_count",
			StatKind::Enrollments => "enrollments_count",
			StatKind::HiddenCourses => "hidden_courses_count",
			StatKind::Learners => "learners_count",
			StatKind::LearningHours => "learning_hours_count",
			StatKind::UniqueLearners => "unique_learners",
		}
	}

	pub fn parse(s: &str) -> Option<StatKind> {
		StatKind::ALL.into_iter().find(|kind| kind.as_str() == s)
	}

	/// Parses a comma-separated stat list. Every unknown entry is reported.
	pub fn parse_list(raw: &str) -> ClResult<Vec<StatKind>> {
		let mut res = Vec::new();
		let mut invalid = Vec::new();
		for item in raw.split(',').map(str::trim) {
			match StatKind::parse(item) {
				Some(kind) if !res.contains(&kind) => res.push(kind),
				Some(_) => {}
				None => invalid.push(item.to_string()),
			}
		}
		if !invalid.is_empty() {
			let invalid: Vec<String> = invalid.into_iter().sorted().dedup().collect();
			return Err(Error::invalid_input(
				format!("Invalid stats type: {:?}", invalid),
				serde_json::json!({ "stats": invalid }),
			));
		}
		Ok(res)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TotalCounts {
	pub tenants: BTreeMap<TnId, BTreeMap<&'static str, u64>>,
	/// `total_<stat>_count` -> sum over tenants
	pub totals: BTreeMap<String, u64>,
	pub total_unique_learners: Option<u64>,
	/// Some orgs are reachable only through course-level roles
	pub limited_access: bool,
}

impl Serialize for TotalCounts {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let extra = usize::from(self.total_unique_learners.is_some()) + 1;
		let mut map = serializer.serialize_map(Some(self.tenants.len() + self.totals.len() + extra))?;
		for (tn_id, counts) in &self.tenants {
			map.serialize_entry(&tn_id.to_string(), counts)?;
		}
		for (key, total) in &self.totals {
			map.serialize_entry(key, total)?;
		}
		if let Some(unique) = self.total_unique_learners {
			map.serialize_entry("total_unique_learners", &unique)?;
		}
		map.serialize_entry("limited_access", &self.limited_access)?;
		map.end()
	}
}

async fn compute_stat(
	app: &App,
	perm: &PermissionInfo,
	tn_id: TnId,
	stat: StatKind,
	include_staff: bool,
) -> ClResult<u64> {
	let filter = CourseFilter::default();
	let sum = |counts: BTreeMap<String, u64>| counts.values().sum::<u64>();
	Ok(match stat {
		StatKind::Certificates => sum(certificates::get_certificates_count(app, perm, filter, include_staff).await?),
		StatKind::Courses => sum(courses::get_courses_count(app, perm, filter).await?),
		StatKind::Enrollments => sum(courses::get_enrollments_count(app, perm, filter, include_staff).await?),
		StatKind::HiddenCourses => {
			sum(courses::get_courses_count(app, perm, CourseFilter::visible(Some(false))).await?)
		}
		StatKind::Learners => learners::get_tenant_learners_total(app, perm, tn_id, filter).await?,
		StatKind::LearningHours => {
			// whole hours, the fraction is dropped
			certificates::get_learning_hours_count(app, perm, filter, include_staff).await?.trunc() as u64
		}
		StatKind::UniqueLearners => learners::get_unique_learners_count(app, perm, filter).await?,
	})
}

async fn tenant_stat(
	app: &App,
	perm: &PermissionInfo,
	tn_id: TnId,
	stat: StatKind,
	include_staff: bool,
	mode: CacheMode,
) -> ClResult<u64> {
	let perm = perm.limit_to_tenant(tn_id);
	let key = format!(
		"{}{}_{}_s{}_{}",
		KEY_PREFIX_STATISTICS,
		stat.as_str(),
		tn_id,
		u8::from(include_staff),
		perm.scope_hash()
	);
	app.cache
		.cached(&key, app.settings.cache_timeout_statistics, mode, || {
			compute_stat(app, &perm, tn_id, stat, include_staff)
		})
		.await
}

pub async fn get_total_counts(
	app: &App,
	perm: &PermissionInfo,
	stats: &[StatKind],
	include_staff: bool,
	mode: CacheMode,
) -> ClResult<TotalCounts> {
	let mut res = TotalCounts {
		limited_access: !perm.course_access_orgs.is_empty(),
		..TotalCounts::default()
	};

	for stat in stats.iter().copied().filter(|stat| *stat != StatKind::UniqueLearners) {
		res.totals.insert(format!("total_{}", stat.result_key()), 0);
	}
	for tn_id in &perm.tenant_ids_any_access {
		let counts = res.tenants.entry(*tn_id).or_default();
		for stat in stats.iter().copied().filter(|stat| *stat != StatKind::UniqueLearners) {
			let count = tenant_stat(app, perm, *tn_id, stat, include_staff, mode).await?;
			counts.insert(stat.result_key(), count);
			*res.totals.entry(format!("total_{}", stat.result_key())).or_default() += count;
		}
	}

	if stats.contains(&StatKind::UniqueLearners) {
		let key = format!(
			"{}{}_{}",
			KEY_PREFIX_STATISTICS,
			StatKind::UniqueLearners.as_str(),
			perm.scope_hash()
		);
		let unique = app
			.cache
			.cached(&key, app.settings.cache_timeout_statistics, mode, || {
				learners::get_unique_learners_count(app, perm, CourseFilter::default())
			})
			.await?;
		res.total_unique_learners = Some(unique);
	}
	info!(tenants = res.tenants.len(), stats = stats.len(), "total counts computed");
	Ok(res)
}


// vim: ts=4
