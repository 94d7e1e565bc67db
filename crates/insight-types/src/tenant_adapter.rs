//! Adapter that reads the external tenant configuration store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::prelude::*;

/// `course_org_filter` is stored either as a single string or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OrgFilter {
	One(Box<str>),
	Many(Vec<Box<str>>),
}

impl OrgFilter {
	/// Canonical, deduplicated and sorted org names. Blank entries are dropped.
	pub fn to_orgs(&self) -> Vec<OrgName> {
		let mut orgs: Vec<OrgName> = match self {
			OrgFilter::One(org) => OrgName::new(org).into_iter().collect(),
			OrgFilter::Many(orgs) => orgs.iter().filter_map(|org| OrgName::new(org)).collect(),
		};
		orgs.sort();
		orgs.dedup();
		orgs
	}
}

#[derive(Debug, Clone)]
pub struct TenantConfig {
	pub tn_id: TnId,
	/// Site domains routed to this tenant
	pub routes: Vec<Box<str>>,
	pub lms_base: Option<Box<str>>,
	pub course_org_filter: Option<OrgFilter>,
	pub dashboard_enabled: bool,
	pub platform_name: Option<Box<str>>,
	pub logo_image_url: Option<Box<str>>,
}

#[async_trait]
pub trait TenantConfigAdapter: Debug + Send + Sync {
	/// Every tenant configuration, in tenant ID order
	async fn list_tenant_configs(&self) -> ClResult<Vec<TenantConfig>>;
}


// vim: ts=4
