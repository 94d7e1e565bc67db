//! Learner counts
//!
//! A learner is an active account that is neither platform staff nor superuser.
//! Two cohorts are reported per tenant:
//!
//! - enrolled: an active enrollment in an in-scope course whose org the user
//!   holds no role row for
//! - no enrollment: tied to the tenant's site by a signup record but without an
//!   active in-scope enrollment, plus users whose in-scope enrollments are all
//!   inactive and who have no signup at the site
//!
//! The cohorts are disjoint. The second one is only computed when every org of
//! the tenant is fully accessible, otherwise it is zero.
//!
//! Tenants are computed one at a time, each with a single enrollment read.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::prelude::*;
use crate::scope::CourseFilter;
use insight_core::roles::RoleHolders;
use insight_core::tenants;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantLearners {
	pub learners_count: u64,
	pub learners_count_no_enrollment: u64,
	pub learners_count_per_org: BTreeMap<String, u64>,
}

/// User sets behind one tenant's counts
#[derive(Debug, Clone, Default)]
pub struct LearnerSets {
	pub enrolled: BTreeSet<UserId>,
	pub per_org: BTreeMap<OrgName, (Box<str>, BTreeSet<UserId>)>,
	pub no_enrollment: BTreeSet<UserId>,
}

impl LearnerSets {
	pub fn counts(&self) -> TenantLearners {
		TenantLearners {
			learners_count: self.enrolled.len() as u64,
			learners_count_no_enrollment: self.no_enrollment.len() as u64,
			learners_count_per_org: self
				.per_org
				.values()
				.filter(|(_, users)| !users.is_empty())
				.map(|(label, users)| (label.to_string(), users.len() as u64))
				.collect(),
		}
	}

	/// Every user of both cohorts
	pub fn all_users(&self) -> impl Iterator<Item = UserId> + '_ {
		self.enrolled.iter().chain(self.no_enrollment.iter()).copied()
	}
}

pub async fn get_tenant_learner_sets(
	app: &App,
	perm: &PermissionInfo,
	tn_id: TnId,
	filter: CourseFilter,
) -> ClResult<LearnerSets> {
	let perm = perm.limit_to_tenant(tn_id);
	let mut sets = LearnerSets::default();
	if !perm.has_access() {
		return Ok(sets);
	}

	let enrollments = app.learning_adapter.list_enrollments(&filter.query(&perm)).await?;
	let holders = RoleHolders::load(app, &perm.any_access_org_list()).await?;

	// plain learners with an active enrollment, role holders included
	let mut active: HashSet<UserId> = HashSet::new();
	let mut inactive: BTreeSet<UserId> = BTreeSet::new();
	for row in &enrollments {
		if !row.user.is_plain_learner() {
			continue;
		}
		let Some(org) = OrgName::new(&row.org) else {
			continue;
		};
		if !row.is_active {
			inactive.insert(row.user_id);
			continue;
		}
		active.insert(row.user_id);
		if holders.has_org_row(row.user_id, &org) {
			continue;
		}
		sets.enrolled.insert(row.user_id);
		sets.per_org.entry(org).or_insert_with(|| (row.org.clone(), BTreeSet::new())).1.insert(row.user_id);
	}

	if !perm.is_full_access_tenant(tn_id) {
		return Ok(sets);
	}

	let tenants = tenants::load_tenants_info(app).await?;
	let mut signed_up: HashSet<UserId> = HashSet::new();
	if let Some(site) = tenants.sites.get(&tn_id) {
		for (user_id, flags) in app.user_adapter.list_site_signups(site).await? {
			signed_up.insert(user_id);
			if !flags.is_plain_learner() || active.contains(&user_id) {
				continue;
			}
			if perm.full_access_orgs.iter().any(|org| holders.has_org_row(user_id, org)) {
				continue;
			}
			sets.no_enrollment.insert(user_id);
		}
	}
	sets.no_enrollment.extend(
		inactive.into_iter().filter(|user_id| !active.contains(user_id) && !signed_up.contains(user_id)),
	);
	Ok(sets)
}

/// Learner counts of every tenant in the descriptor
pub async fn get_learners_count(
	app: &App,
	perm: &PermissionInfo,
	filter: CourseFilter,
) -> ClResult<BTreeMap<TnId, TenantLearners>> {
	let mut res = BTreeMap::new();
	for tn_id in &perm.tenant_ids_any_access {
		let sets = get_tenant_learner_sets(app, perm, *tn_id, filter).await?;
		res.insert(*tn_id, sets.counts());
	}
	debug!(tenants = res.len(), "learners counted");
	Ok(res)
}

/// Learners of one tenant, both cohorts
pub async fn get_tenant_learners_total(
	app: &App,
	perm: &PermissionInfo,
	tn_id: TnId,
	filter: CourseFilter,
) -> ClResult<u64> {
	let counts = get_tenant_learner_sets(app, perm, tn_id, filter).await?.counts();
	Ok(counts.learners_count + counts.learners_count_no_enrollment)
}

/// Distinct learners over every tenant in the descriptor
pub async fn get_unique_learners_count(
	app: &App,
	perm: &PermissionInfo,
	filter: CourseFilter,
) -> ClResult<u64> {
	let mut users: BTreeSet<UserId> = BTreeSet::new();
	for tn_id in &perm.tenant_ids_any_access {
		users.extend(get_tenant_learner_sets(app, perm, *tn_id, filter).await?.all_users());
	}
	Ok(users.len() as u64)
}


// vim: ts=4
