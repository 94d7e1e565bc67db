//! Tenant registry
//!
//! Maps tenant IDs to their site and canonical org list. The whole registry is
//! built from the tenant configuration store in one pass and cached as a single
//! snapshot. Misconfigured tenants are excluded and reported with reason codes.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::cache::{CacheMode, KEY_TENANTS_INFO};
use crate::prelude::*;
use insight_types::codes;
use insight_types::tenant_adapter::{OrgFilter, TenantConfig};
use insight_types::utils::url_host;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TenantInfo {
	pub lms_root_url: Box<str>,
	pub platform_name: Box<str>,
	pub logo_image_url: Box<str>,
}

/// Snapshot of every valid tenant
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TenantsInfo {
	pub tenant_ids: Vec<TnId>,
	pub orgs: BTreeMap<TnId, Vec<OrgName>>,
	pub org_tenants: BTreeMap<OrgName, Vec<TnId>>,
	pub sites: BTreeMap<TnId, Box<str>>,
	pub tenant_by_site: BTreeMap<Box<str>, TnId>,
	pub info: BTreeMap<TnId, TenantInfo>,
	/// Excluded tenant -> reason codes
	pub excluded: BTreeMap<TnId, Vec<u32>>,
}

impl TenantsInfo {
	pub fn build(configs: &[TenantConfig]) -> Self {
		let mut res = TenantsInfo::default();

		for config in configs {
			let reasons = exclusion_reasons(config);
			if !reasons.is_empty() {
				warn!(tn_id = %config.tn_id, ?reasons, "tenant excluded");
				res.excluded.insert(config.tn_id, reasons);
				continue;
			}

			let tn_id = config.tn_id;
			let orgs = config.course_org_filter.as_ref().map(OrgFilter::to_orgs).unwrap_or_default();
			for org in &orgs {
				res.org_tenants.entry(org.clone()).or_default().push(tn_id);
			}
			if let Some(site) = config.routes.first() {
				res.sites.insert(tn_id, site.clone());
				res.tenant_by_site.insert(site.to_lowercase().into(), tn_id);
			}
			res.info.insert(tn_id, tenant_info(config));
			res.orgs.insert(tn_id, orgs);
			res.tenant_ids.push(tn_id);
		}
		res.tenant_ids.sort();
		for tenants in res.org_tenants.values_mut() {
			tenants.sort();
			tenants.dedup();
		}
		res
	}

	pub fn is_valid(&self, tn_id: TnId) -> bool {
		self.orgs.contains_key(&tn_id)
	}

	pub fn tenant_orgs(&self, tn_id: TnId) -> &[OrgName] {
		self.orgs.get(&tn_id).map_or(&[], Vec::as_slice)
	}

	pub fn tenants_by_org(&self, org: &OrgName) -> &[TnId] {
		self.org_tenants.get(org).map_or(&[], Vec::as_slice)
	}
}

/// Reason codes why a tenant cannot be served, empty if it is valid
pub fn exclusion_reasons(config: &TenantConfig) -> Vec<u32> {
	let mut reasons = Vec::new();
	let lms_base = config.lms_base.as_deref().map(str::trim).filter(|b| !b.is_empty());

	if config.routes.is_empty() {
		reasons.push(codes::TENANT_HAS_NO_SITE);
	}
	if config.routes.len() > 1 {
		reasons.push(codes::TENANT_HAS_MORE_THAN_ONE_SITE);
	}
	if lms_base.is_none() {
		reasons.push(codes::TENANT_HAS_NO_LMS_BASE);
	}
	if reasons.is_empty() {
		let route = config.routes.first().map(|r| r.trim().to_lowercase());
		if lms_base.and_then(url_host) != route {
			reasons.push(codes::TENANT_LMS_BASE_SITE_MISMATCH);
		}
	}
	if !config.dashboard_enabled {
		reasons.push(codes::TENANT_DASHBOARD_NOT_ENABLED);
	}
	if config.course_org_filter.as_ref().is_none_or(|filter| filter.to_orgs().is_empty()) {
		reasons.push(codes::TENANT_COURSE_ORG_FILTER_NOT_VALID);
	}
	reasons
}

fn tenant_info(config: &TenantConfig) -> TenantInfo {
	let clean = |v: &Option<Box<str>>| -> Box<str> { v.as_deref().map(str::trim).unwrap_or_default().into() };
	let lms_base = config.lms_base.as_deref().map(str::trim).unwrap_or_default();
	let lms_root_url = if lms_base.is_empty() || lms_base.contains("://") {
		lms_base.to_string()
	} else {
		format!("https://{}", lms_base)
	};
	TenantInfo {
		lms_root_url: lms_root_url.into(),
		platform_name: clean(&config.platform_name),
		logo_image_url: clean(&config.logo_image_url),
	}
}

/// Cached snapshot of all tenants
pub async fn load_tenants_info(app: &App) -> ClResult<TenantsInfo> {
	app.cache
		.cached(KEY_TENANTS_INFO, app.settings.cache_timeout_tenants_info, CacheMode::Use, || async {
			let configs = app.tenant_adapter.list_tenant_configs().await?;
			Ok(TenantsInfo::build(&configs))
		})
		.await
}

pub async fn get_all_tenant_ids(app: &App) -> ClResult<Vec<TnId>> {
	Ok(load_tenants_info(app).await?.tenant_ids)
}

/// Canonical org set for each requested tenant. Unknown and excluded tenants map
/// to an empty set.
pub async fn resolve_tenant_orgs(
	app: &App,
	tn_ids: &[TnId],
) -> ClResult<BTreeMap<TnId, BTreeSet<OrgName>>> {
	let tenants = load_tenants_info(app).await?;
	Ok(tn_ids
		.iter()
		.map(|tn_id| (*tn_id, tenants.tenant_orgs(*tn_id).iter().cloned().collect()))
		.collect())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrgFilterList {
	/// Merged orgs in first-seen order
	pub course_org_filter_list: Vec<OrgName>,
	/// Tenant -> other requested tenants sharing at least one org with it
	pub duplicates: BTreeMap<TnId, Vec<TnId>>,
	/// Requested tenants that are unknown, excluded or have no orgs
	pub invalid: Vec<TnId>,
}

pub fn course_org_filter_list(tenants: &TenantsInfo, tn_ids: &[TnId]) -> OrgFilterList {
	let mut res = OrgFilterList::default();
	let mut seen: BTreeMap<&OrgName, Vec<TnId>> = BTreeMap::new();

	for &tn_id in tn_ids {
		let orgs = tenants.tenant_orgs(tn_id);
		if orgs.is_empty() {
			res.invalid.push(tn_id);
			continue;
		}
		for org in orgs {
			let owners = seen.entry(org).or_default();
			if owners.is_empty() {
				res.course_org_filter_list.push(org.clone());
			}
			for &other in owners.iter() {
				res.duplicates.entry(other).or_default().push(tn_id);
				res.duplicates.entry(tn_id).or_default().push(other);
			}
			owners.push(tn_id);
		}
	}
	for others in res.duplicates.values_mut() {
		*others = others.iter().copied().unique().collect();
	}
	res
}

pub async fn get_course_org_filter_list(app: &App, tn_ids: &[TnId]) -> ClResult<OrgFilterList> {
	let tenants = load_tenants_info(app).await?;
	Ok(course_org_filter_list(&tenants, tn_ids))
}

/// Tenants whose org list contains `org` (any casing)
pub async fn get_tenants_by_org(app: &App, org: &str) -> ClResult<Vec<TnId>> {
	let Some(org) = OrgName::new(org) else {
		return Ok(Vec::new());
	};
	Ok(load_tenants_info(app).await?.tenants_by_org(&org).to_vec())
}

pub async fn get_tenant_site(app: &App, tn_id: TnId) -> ClResult<Option<Box<str>>> {
	Ok(load_tenants_info(app).await?.sites.get(&tn_id).cloned())
}

pub async fn get_tenants_sites(app: &App, tn_ids: &[TnId]) -> ClResult<Vec<Box<str>>> {
	let tenants = load_tenants_info(app).await?;
	Ok(tn_ids.iter().filter_map(|tn_id| tenants.sites.get(tn_id).cloned()).collect())
}

pub async fn get_tenants_info(
	app: &App,
	tn_ids: &[TnId],
) -> ClResult<BTreeMap<TnId, Option<TenantInfo>>> {
	let tenants = load_tenants_info(app).await?;
	Ok(tn_ids.iter().map(|tn_id| (*tn_id, tenants.info.get(tn_id).cloned())).collect())
}


// vim: ts=4
