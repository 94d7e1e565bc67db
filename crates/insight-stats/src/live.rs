//! Live statistics per tenant

use serde::{Deserialize, Serialize};

use crate::certificates;
use crate::courses;
use crate::learners;
use crate::prelude::*;
use crate::scope::CourseFilter;
use insight_core::cache::{CacheMode, KEY_PREFIX_LIVE_STATISTICS};
use insight_core::permission::build_fx_permission_info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveStatistics {
	pub learners_count: u64,
	pub courses_count: u64,
	pub enrollments_count: u64,
	pub certificates_count: u64,
	pub learning_hours_count: f64,
}

async fn compute_live_statistics(app: &App, tn_id: TnId) -> ClResult<LiveStatistics> {
	let perm = build_fx_permission_info(app, &[tn_id]).await?;
	let mut res = LiveStatistics::default();
	if perm.tenant_ids_any_access.is_empty() {
		return Ok(res);
	}
	let filter = CourseFilter::default();

	res.learners_count = learners::get_tenant_learners_total(app, &perm, tn_id, filter).await?;
	res.courses_count = courses::get_courses_count(app, &perm, filter).await?.values().sum();
	res.enrollments_count = courses::get_enrollments_count(app, &perm, filter, false).await?.values().sum();
	res.certificates_count =
		certificates::get_certificates_count(app, &perm, filter, false).await?.values().sum();
	res.learning_hours_count = certificates::get_learning_hours_count(app, &perm, filter, false).await?;
	Ok(res)
}

/// System-level statistics of one tenant, cached per tenant
pub async fn get_live_statistics(app: &App, tn_id: TnId, mode: CacheMode) -> ClResult<LiveStatistics> {
	let key = format!("{}{}", KEY_PREFIX_LIVE_STATISTICS, tn_id);
	app.cache
		.cached(&key, app.settings.cache_timeout_live_statistics, mode, || compute_live_statistics(app, tn_id))
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing;

	#[tokio::test]
	async fn test_live_statistics() {
		let app = testing::setup();
		let stats = get_live_statistics(&app, TnId(1), CacheMode::Use).await.unwrap();
		assert_eq!(stats.learners_count, 4);
		assert_eq!(stats.courses_count, 3);
		assert_eq!(stats.enrollments_count, 3);
		assert_eq!(stats.certificates_count, 3);
		assert!((stats.learning_hours_count - 26.5).abs() < f64::EPSILON);
		assert_eq!(app.cache.len(), 2);

		// unknown tenant: zero values, still a result
		let stats = get_live_statistics(&app, TnId(42), CacheMode::Skip).await.unwrap();
		assert_eq!(stats, LiveStatistics::default());
	}
}

// vim: ts=4
