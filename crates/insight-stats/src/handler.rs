//! Statistics handlers

use axum::{
	Json,
	extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::aggregated_counts::{self, AggregatedCounts, AggregatedCountsOptions};
use crate::listing::{self, LearnersPage, Pagination};
use crate::live::{self, LiveStatistics};
use crate::periods::{self, AggregatePeriod, PeriodQuery};
use crate::prelude::*;
use crate::ratings::{self, GlobalRating};
use crate::total_counts::{self, StatKind, TotalCounts};
use insight_core::cache::CacheMode;
use insight_core::extract::Auth;
use insight_core::permission::get_fx_permission_info;
use insight_core::roles;

/// Roles allowed to read statistics
pub const VIEW_ROLES: &[&str] = &["staff", "instructor", "data_researcher", "org_course_creator_group"];

/// GET /api/statistics/total_counts
#[derive(Debug, Default, Deserialize)]
pub struct TotalCountsQuery {
	pub stats: Option<String>,
	pub tenant_ids: Option<String>,
	/// `1` keeps course staff in the counts
	pub include_staff: Option<String>,
}

pub async fn get_total_counts(
	State(app): State<App>,
	Auth(user): Auth,
	Query(q): Query<TotalCountsQuery>,
) -> ClResult<Json<TotalCounts>> {
	let stats = StatKind::parse_list(q.stats.as_deref().unwrap_or_default())?;
	let tn_ids = roles::check_tenant_access(&app, &user, q.tenant_ids.as_deref(), Some(VIEW_ROLES)).await?;
	let perm = get_fx_permission_info(&app, &user, &tn_ids, VIEW_ROLES).await?;
	let include_staff = q.include_staff.as_deref() == Some("1");

	let res = total_counts::get_total_counts(&app, &perm, &stats, include_staff, CacheMode::Use).await?;
	Ok(Json(res))
}

/// GET /api/statistics/aggregated_counts
#[derive(Debug, Default, Deserialize)]
pub struct AggregatedCountsQuery {
	pub stats: Option<String>,
	pub tenant_ids: Option<String>,
	pub include_staff: Option<String>,
	/// `day`, `month`, `quarter` or `year`, required
	pub aggregate_period: Option<String>,
	pub date_from: Option<String>,
	pub date_to: Option<String>,
	/// `1` (default) cuts long ranges at the start, anything else at the end
	pub favors_backward: Option<String>,
	pub max_period_chunks: Option<String>,
	pub fill_missing_periods: Option<String>,
}

impl AggregatedCountsQuery {
	fn period_query(&self) -> ClResult<PeriodQuery> {
		let period = AggregatePeriod::parse(self.aggregate_period.as_deref().unwrap_or_default())?;
		let max_chunks = match self.max_period_chunks.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
			None => 0,
			Some(raw) => raw.parse::<i64>().map_err(|_| {
				Error::invalid_input(
					"Invalid max_period_chunks. It must be an integer.",
					serde_json::json!({ "max_period_chunks": raw }),
				)
			})?,
		};
		// out of range falls back to the default
		let max_chunks = if (0..=period.default_max_chunks()).contains(&max_chunks) { max_chunks } else { 0 };

		let date = |name: &str, raw: Option<&str>| -> ClResult<_> {
			raw.filter(|raw| !raw.trim().is_empty()).map(|raw| periods::parse_date(name, raw)).transpose()
		};
		Ok(PeriodQuery {
			period,
			date_from: date("date_from", self.date_from.as_deref())?,
			date_to: date("date_to", self.date_to.as_deref())?,
			favors_backward: self.favors_backward.as_deref().unwrap_or("1") == "1",
			max_chunks,
		})
	}
}

pub async fn get_aggregated_counts(
	State(app): State<App>,
	Auth(user): Auth,
	Query(q): Query<AggregatedCountsQuery>,
) -> ClResult<Json<AggregatedCounts>> {
	let stats = StatKind::parse_list(q.stats.as_deref().unwrap_or_default())?;
	let opts = AggregatedCountsOptions {
		periods: q.period_query()?,
		include_staff: q.include_staff.as_deref() == Some("1"),
		fill_missing_periods: q.fill_missing_periods.as_deref().unwrap_or("1") == "1",
	};
	let tn_ids = roles::check_tenant_access(&app, &user, q.tenant_ids.as_deref(), Some(VIEW_ROLES)).await?;
	let perm = get_fx_permission_info(&app, &user, &tn_ids, VIEW_ROLES).await?;

	let res = aggregated_counts::get_aggregated_counts(&app, &perm, &stats, &opts).await?;
	Ok(Json(res))
}

/// GET /api/statistics/rating
#[derive(Debug, Default, Deserialize)]
pub struct GlobalRatingQuery {
	pub tenant_ids: Option<String>,
}

pub async fn get_global_rating(
	State(app): State<App>,
	Auth(user): Auth,
	Query(q): Query<GlobalRatingQuery>,
) -> ClResult<Json<GlobalRating>> {
	let tn_ids = roles::check_tenant_access(&app, &user, q.tenant_ids.as_deref(), Some(VIEW_ROLES)).await?;
	let perm = get_fx_permission_info(&app, &user, &tn_ids, VIEW_ROLES).await?;

	let res = ratings::get_global_rating(&app, &perm, CacheMode::Use).await?;
	Ok(Json(res))
}

/// GET /api/statistics/learners
#[derive(Debug, Default, Deserialize)]
pub struct ListLearnersQuery {
	pub tenant_ids: Option<String>,
	pub search_text: Option<String>,
	pub page: Option<u32>,
	pub page_size: Option<u32>,
}

pub async fn list_learners(
	State(app): State<App>,
	Auth(user): Auth,
	Query(q): Query<ListLearnersQuery>,
) -> ClResult<Json<LearnersPage>> {
	let pagination = Pagination::new(q.page, q.page_size)?;
	let tn_ids = roles::check_tenant_access(&app, &user, q.tenant_ids.as_deref(), Some(VIEW_ROLES)).await?;
	let perm = get_fx_permission_info(&app, &user, &tn_ids, VIEW_ROLES).await?;

	let page = listing::list_learners(&app, &perm, q.search_text.as_deref(), pagination).await?;
	Ok(Json(page))
}

/// GET /api/statistics/live/{tn_id}
pub async fn get_live_statistics(
	State(app): State<App>,
	Auth(user): Auth,
	Path(tn_id): Path<u32>,
) -> ClResult<Json<LiveStatistics>> {
	let tn_id = TnId(tn_id);
	roles::check_tenant_access(&app, &user, Some(&tn_id.to_string()), Some(VIEW_ROLES)).await?;

	let stats = live::get_live_statistics(&app, tn_id, CacheMode::Use).await?;
	Ok(Json(stats))
}


// vim: ts=4
