//! Counts per period over a permission scope
//!
//! Each tenant gets its own series; `all_tenants` sums them label by label.
//! Only enrollments support period aggregation.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::courses;
use crate::periods::{self, AggregatePeriod, PeriodCount, PeriodQuery};
use crate::prelude::*;
use crate::scope::CourseFilter;
use crate::total_counts::StatKind;

pub const AGGREGATED_STATS: &[StatKind] = &[StatKind::Enrollments];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatedCountsOptions {
	pub periods: PeriodQuery,
	pub include_staff: bool,
	/// Zero entries for periods without data
	pub fill_missing_periods: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySettings {
	pub aggregate_period: AggregatePeriod,
	/// `YYYY-MM-DD`, absent for an open range
	pub date_from: Option<String>,
	pub date_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantSeries {
	pub tenant_id: TnId,
	pub totals: BTreeMap<&'static str, u64>,
	#[serde(flatten)]
	pub series: BTreeMap<&'static str, Vec<PeriodCount>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllTenantsSeries {
	pub totals: BTreeMap<&'static str, u64>,
	#[serde(flatten)]
	pub series: BTreeMap<&'static str, Vec<PeriodCount>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedCounts {
	pub query_settings: QuerySettings,
	pub by_tenant: Vec<TenantSeries>,
	pub all_tenants: AllTenantsSeries,
	pub limited_access: bool,
}

/// Rejects stats without period support, reporting every one of them
pub fn check_stats(stats: &[StatKind]) -> ClResult<()> {
	let invalid: Vec<&str> =
		stats.iter().filter(|stat| !AGGREGATED_STATS.contains(stat)).map(|stat| stat.as_str()).collect();
	if invalid.is_empty() {
		Ok(())
	} else {
		Err(Error::invalid_input(
			format!("Invalid stats type: {:?}", invalid),
			serde_json::json!({ "stats": invalid }),
		))
	}
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
	date.map(|date| date.format(periods::DATE_FORMAT).to_string())
}

pub async fn get_aggregated_counts(
	app: &App,
	perm: &PermissionInfo,
	stats: &[StatKind],
	opts: &AggregatedCountsOptions,
) -> ClResult<AggregatedCounts> {
	check_stats(stats)?;

	// resolved once so every tenant shares the same range
	let (date_from, date_to) = opts.periods.resolve(Utc::now().date_naive());
	let range = PeriodQuery { date_from, date_to, ..opts.periods };
	let period = range.period;

	let mut all_tenants = AllTenantsSeries::default();
	let mut by_label: BTreeMap<&'static str, BTreeMap<String, u64>> = BTreeMap::new();
	for stat in stats {
		all_tenants.totals.insert(stat.result_key(), 0);
		by_label.insert(stat.result_key(), BTreeMap::new());
	}

	let mut by_tenant = Vec::new();
	for tn_id in &perm.tenant_ids_any_access {
		let tenant_perm = perm.limit_to_tenant(*tn_id);
		let mut tenant = TenantSeries { tenant_id: *tn_id, totals: BTreeMap::new(), series: BTreeMap::new() };

		for stat in stats {
			let key = stat.result_key();
			let series = courses::get_enrollments_count_aggregated(
				app,
				&tenant_perm,
				CourseFilter::default(),
				opts.include_staff,
				&range,
			)
			.await?;
			let counts = if opts.fill_missing_periods {
				periods::fill_missing_periods(period, series.counts, date_from, date_to)
			} else {
				series.counts
			};

			let total: u64 = counts.iter().map(|item| item.value).sum();
			tenant.totals.insert(key, total);
			*all_tenants.totals.entry(key).or_default() += total;
			let labels = by_label.entry(key).or_default();
			for item in &counts {
				*labels.entry(item.label.clone()).or_default() += item.value;
			}
			tenant.series.insert(key, counts);
		}
		by_tenant.push(tenant);
	}

	all_tenants.series = by_label
		.into_iter()
		.map(|(key, labels)| {
			(key, labels.into_iter().map(|(label, value)| PeriodCount { label, value }).collect())
		})
		.collect();

	info!(tenants = by_tenant.len(), period = period.as_str(), "aggregated counts computed");
	Ok(AggregatedCounts {
		query_settings: QuerySettings {
			aggregate_period: period,
			date_from: format_date(date_from),
			date_to: format_date(date_to),
		},
		by_tenant,
		all_tenants,
		limited_access: !perm.course_access_orgs.is_empty(),
	})
}


// vim: ts=4
