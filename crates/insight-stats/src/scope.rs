//! Course filters and per-org tallies shared by the aggregators

use std::collections::BTreeMap;

use crate::prelude::*;
use insight_types::course_query::CourseQuery;

/// Catalog visibility and date-window filters. `None` means no filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseFilter {
	pub visible: Option<bool>,
	pub active: Option<bool>,
}

impl Default for CourseFilter {
	fn default() -> Self {
		CourseFilter { visible: Some(true), active: None }
	}
}

impl CourseFilter {
	pub fn visible(visible: Option<bool>) -> Self {
		CourseFilter { visible, ..CourseFilter::default() }
	}

	pub fn only_active() -> Self {
		CourseFilter { active: Some(true), ..CourseFilter::default() }
	}

	pub fn query(&self, perm: &PermissionInfo) -> CourseQuery {
		perm.course_query().visible(self.visible).active(self.active)
	}
}

/// Counts grouped by canonical org, labelled with the first spelling seen.
/// Orgs that never get a non-zero count are left out.
#[derive(Debug, Clone, Default)]
pub struct OrgCounter {
	counts: BTreeMap<OrgName, (Box<str>, u64)>,
}

impl OrgCounter {
	pub fn add(&mut self, raw_org: &str, n: u64) {
		if n == 0 {
			return;
		}
		let Some(org) = OrgName::new(raw_org) else {
			return;
		};
		self.counts.entry(org).or_insert_with(|| (raw_org.into(), 0)).1 += n;
	}

	pub fn total(&self) -> u64 {
		self.counts.values().map(|(_, n)| n).sum()
	}

	pub fn into_map(self) -> BTreeMap<String, u64> {
		self.counts.into_values().map(|(label, n)| (label.into(), n)).collect()
	}
}


// vim: ts=4
