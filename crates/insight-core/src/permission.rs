//! Permission info builder
//!
//! A [`PermissionInfo`] is built once per request and never changes afterwards.
//! Every statistics query derives its course filter from it. A user without
//! access to any requested tenant gets a descriptor with no orgs, which makes
//! every aggregation return zero.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

use crate::prelude::*;
use crate::roles::{self, AccessLevel, RoleKind, UserRoles};
use crate::tenants::{self, TenantsInfo};
use insight_types::course_query::{CourseQuery, CourseScope};
use insight_types::user_adapter::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionInfo {
	/// `None` for system-level descriptors
	pub user: Option<User>,
	pub user_roles: UserRoles,
	pub is_system_staff: bool,
	pub view_allowed_roles: Vec<Box<str>>,
	/// Orgs where every course is reachable
	pub full_access_orgs: BTreeSet<OrgName>,
	/// Orgs reachable only through course-level roles, never overlapping `full_access_orgs`
	pub course_access_orgs: BTreeSet<OrgName>,
	pub any_access_orgs: BTreeSet<OrgName>,
	/// Course id to the course's org, for courses reached through course-level roles
	pub course_limited_access: BTreeMap<Box<str>, OrgName>,
	pub tenant_ids_any_access: BTreeSet<TnId>,
	pub tenant_ids_full_access: BTreeSet<TnId>,
	pub tenant_ids_partial_access: BTreeSet<TnId>,
	pub tenant_ids_elevated: BTreeSet<TnId>,
	/// Orgs of every tenant with any access
	pub tenant_orgs: BTreeMap<TnId, Vec<OrgName>>,
}

impl PermissionInfo {
	fn empty(user: Option<User>, view_allowed_roles: Vec<Box<str>>) -> Self {
		PermissionInfo {
			is_system_staff: user.is_none(),
			user,
			user_roles: UserRoles::default(),
			view_allowed_roles,
			full_access_orgs: BTreeSet::new(),
			course_access_orgs: BTreeSet::new(),
			any_access_orgs: BTreeSet::new(),
			course_limited_access: BTreeMap::new(),
			tenant_ids_any_access: BTreeSet::new(),
			tenant_ids_full_access: BTreeSet::new(),
			tenant_ids_partial_access: BTreeSet::new(),
			tenant_ids_elevated: BTreeSet::new(),
			tenant_orgs: BTreeMap::new(),
		}
	}

	/// Fills the tenant sets from the org sets
	fn finish(mut self, tenants: &TenantsInfo, tn_ids: &[TnId]) -> Self {
		self.course_access_orgs.retain(|org| !self.full_access_orgs.contains(org));
		self.any_access_orgs = self.full_access_orgs.union(&self.course_access_orgs).cloned().collect();

		for &tn_id in tn_ids {
			let orgs = tenants.tenant_orgs(tn_id);
			if orgs.is_empty() || !orgs.iter().any(|org| self.any_access_orgs.contains(org)) {
				continue;
			}
			self.tenant_ids_any_access.insert(tn_id);
			if orgs.iter().all(|org| self.full_access_orgs.contains(org)) {
				self.tenant_ids_full_access.insert(tn_id);
			} else {
				self.tenant_ids_partial_access.insert(tn_id);
			}
			self.tenant_orgs.insert(tn_id, orgs.to_vec());
		}
		self.tenant_ids_elevated.retain(|tn_id| self.tenant_ids_any_access.contains(tn_id));
		self
	}

	/// Narrows the descriptor to a single tenant
	pub fn limit_to_tenant(&self, tn_id: TnId) -> PermissionInfo {
		let tenant_orgs: BTreeSet<OrgName> =
			self.tenant_orgs.get(&tn_id).map(|orgs| orgs.iter().cloned().collect()).unwrap_or_default();
		let keep = |set: &BTreeSet<TnId>| -> BTreeSet<TnId> { set.iter().copied().filter(|t| *t == tn_id).collect() };

		PermissionInfo {
			user: self.user.clone(),
			user_roles: self.user_roles.clone(),
			is_system_staff: self.is_system_staff,
			view_allowed_roles: self.view_allowed_roles.clone(),
			full_access_orgs: self.full_access_orgs.intersection(&tenant_orgs).cloned().collect(),
			course_access_orgs: self.course_access_orgs.intersection(&tenant_orgs).cloned().collect(),
			any_access_orgs: self.any_access_orgs.intersection(&tenant_orgs).cloned().collect(),
			course_limited_access: self
				.course_limited_access
				.iter()
				.filter(|(_, org)| tenant_orgs.contains(*org))
				.map(|(course_id, org)| (course_id.clone(), org.clone()))
				.collect(),
			tenant_ids_any_access: keep(&self.tenant_ids_any_access),
			tenant_ids_full_access: keep(&self.tenant_ids_full_access),
			tenant_ids_partial_access: keep(&self.tenant_ids_partial_access),
			tenant_ids_elevated: keep(&self.tenant_ids_elevated),
			tenant_orgs: self
				.tenant_orgs
				.get(&tn_id)
				.map(|orgs| BTreeMap::from([(tn_id, orgs.clone())]))
				.unwrap_or_default(),
		}
	}

	pub fn has_access(&self) -> bool {
		!self.any_access_orgs.is_empty()
	}

	pub fn is_full_access_tenant(&self, tn_id: TnId) -> bool {
		self.tenant_ids_full_access.contains(&tn_id)
	}

	pub fn any_access_org_list(&self) -> Vec<OrgName> {
		self.any_access_orgs.iter().cloned().collect()
	}

	/// Base course query for this scope: visible courses only, no date filter
	pub fn course_query(&self) -> CourseQuery {
		let scope = if self.course_access_orgs.is_empty() {
			CourseScope::All
		} else {
			CourseScope::Restricted {
				full_orgs: self.full_access_orgs.clone(),
				courses: self.course_limited_access.keys().cloned().collect(),
			}
		};
		CourseQuery::new(self.any_access_orgs.iter().cloned()).restrict_to(scope)
	}

	/// Stable digest of the course scope, for cache keys
	pub fn scope_hash(&self) -> String {
		let mut hasher = Sha256::new();
		for org in &self.full_access_orgs {
			hasher.update(b"F:");
			hasher.update(org.as_str().as_bytes());
			hasher.update(b"\n");
		}
		for org in &self.course_access_orgs {
			hasher.update(b"C:");
			hasher.update(org.as_str().as_bytes());
			hasher.update(b"\n");
		}
		for course_id in self.course_limited_access.keys() {
			hasher.update(b"K:");
			hasher.update(course_id.as_bytes());
			hasher.update(b"\n");
		}
		hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
	}
}

/// System-level descriptor with full access to the tenants' orgs
pub async fn build_fx_permission_info(app: &App, tn_ids: &[TnId]) -> ClResult<PermissionInfo> {
	let tenants = tenants::load_tenants_info(app).await?;
	let mut info = PermissionInfo::empty(None, Vec::new());
	for tn_id in tn_ids {
		info.full_access_orgs.extend(tenants.tenant_orgs(*tn_id).iter().cloned());
	}
	info.tenant_ids_elevated = tn_ids.iter().copied().collect();
	Ok(info.finish(&tenants, tn_ids))
}

/// Descriptor for a user limited to `tn_ids`. Tenants the user cannot access
/// are left out silently; the tenant list is expected to be validated already.
pub async fn get_fx_permission_info(
	app: &App,
	user: &User,
	tn_ids: &[TnId],
	view_roles: &[&str],
) -> ClResult<PermissionInfo> {
	let tenants = tenants::load_tenants_info(app).await?;
	let view_allowed_roles: Vec<Box<str>> = view_roles.iter().map(|r| (*r).into()).collect();
	let mut info = PermissionInfo::empty(Some(user.clone()), view_allowed_roles);
	let requested_orgs: BTreeSet<OrgName> =
		tn_ids.iter().flat_map(|tn_id| tenants.tenant_orgs(*tn_id).iter().cloned()).collect();

	if user.is_system_staff() {
		info.is_system_staff = true;
		info.full_access_orgs = requested_orgs;
		info.tenant_ids_elevated = tn_ids.iter().copied().collect();
		return Ok(info.finish(&tenants, tn_ids));
	}

	let user_roles = roles::get_user_course_access_roles(app, user.user_id).await?;
	let has_global = user_roles
		.filtered(Some(view_roles))
		.any(|(role, _)| RoleKind::of(role) == Some(RoleKind::Global));

	if has_global {
		info.full_access_orgs.clone_from(&requested_orgs);
	} else {
		for (_, access) in user_roles.filtered(Some(view_roles)) {
			info.full_access_orgs.extend(access.orgs_full_access.iter().cloned());
			info.course_access_orgs.extend(access.orgs_of_courses.iter().cloned());
			info.course_limited_access
				.extend(access.course_limited_access.iter().map(|(c, org)| (c.clone(), org.clone())));
		}
		info.full_access_orgs.retain(|org| requested_orgs.contains(org));
		info.course_access_orgs.retain(|org| requested_orgs.contains(org));
		info.course_limited_access.retain(|_, org| requested_orgs.contains(org));
	}

	let access = roles::get_accessible_tenant_ids(app, user, Some(view_roles)).await?;
	info.tenant_ids_elevated =
		tn_ids.iter().copied().filter(|tn_id| access.level(*tn_id) == AccessLevel::Elevated).collect();
	info.user_roles = user_roles;
	Ok(info.finish(&tenants, tn_ids))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mock;

	const VIEW_ROLES: &[&str] = &["staff", "instructor", "data_researcher", "org_course_creator_group", "support"];

	fn orgs(names: &[&str]) -> BTreeSet<OrgName> {
		names.iter().filter_map(|n| OrgName::new(n)).collect()
	}

	#[tokio::test]
	async fn test_system_permission_info() {
		let (app, _store) = mock::setup();
		let info = build_fx_permission_info(&app, &[TnId(1)]).await.unwrap();

		assert!(info.user.is_none());
		assert!(info.is_system_staff);
		assert_eq!(info.full_access_orgs, orgs(&["org1", "org2"]));
		assert_eq!(info.tenant_ids_full_access, BTreeSet::from([TnId(1)]));
		assert_eq!(info.course_query().scope(), &CourseScope::All);
	}

	#[tokio::test]
	async fn test_user_with_mixed_access() {
		let (app, _store) = mock::setup();
		let info = get_fx_permission_info(&app, &mock::user(3), &[TnId(1), TnId(3)], VIEW_ROLES).await.unwrap();

		assert_eq!(info.full_access_orgs, orgs(&["org1"]));
		assert_eq!(info.course_access_orgs, orgs(&["org2"]));
		assert_eq!(info.any_access_orgs, orgs(&["org1", "org2"]));
		assert_eq!(info.tenant_ids_any_access, BTreeSet::from([TnId(1), TnId(3)]));
		assert!(info.tenant_ids_full_access.is_empty());
		assert_eq!(info.tenant_ids_partial_access, BTreeSet::from([TnId(1), TnId(3)]));
		assert_eq!(info.tenant_ids_elevated, BTreeSet::from([TnId(1)]));
		assert!(matches!(info.course_query().scope(), CourseScope::Restricted { .. }));

		let limited = info.limit_to_tenant(TnId(3));
		assert!(limited.full_access_orgs.is_empty());
		assert_eq!(limited.any_access_orgs, orgs(&["org2"]));
		assert_eq!(limited.tenant_ids_any_access, BTreeSet::from([TnId(3)]));
		assert!(limited.tenant_ids_elevated.is_empty());
	}

	#[tokio::test]
	async fn test_limit_to_tenant_narrows_courses() {
		let (app, _store) = mock::setup();
		let info = get_fx_permission_info(&app, &mock::user(11), &[TnId(1), TnId(2)], VIEW_ROLES).await.unwrap();
		assert_eq!(info.course_limited_access.len(), 2);

		let limited = info.limit_to_tenant(TnId(2));
		let courses: Vec<&str> = limited.course_limited_access.keys().map(|c| &**c).collect();
		assert_eq!(courses, vec!["course-v1:ORG3+1+1"]);
		match limited.course_query().scope() {
			CourseScope::Restricted { courses, .. } => assert_eq!(courses.len(), 1),
			scope => panic!("unexpected scope: {:?}", scope),
		}

		// same cache identity as a request for tenant 2 alone
		let alone = get_fx_permission_info(&app, &mock::user(11), &[TnId(2)], VIEW_ROLES).await.unwrap();
		assert_eq!(limited.scope_hash(), alone.scope_hash());
	}

	#[tokio::test]
	async fn test_no_access_is_empty_not_error() {
		let (app, _store) = mock::setup();
		let info = get_fx_permission_info(&app, &mock::user(6), &[TnId(1)], VIEW_ROLES).await.unwrap();
		assert!(!info.has_access());
		assert!(info.course_query().is_empty());
		assert!(info.tenant_ids_any_access.is_empty());

		// roles outside the view's roles do not count
		let info = get_fx_permission_info(&app, &mock::user(3), &[TnId(1)], &["data_researcher"]).await.unwrap();
		assert!(!info.has_access());
	}

	#[tokio::test]
	async fn test_global_role_gets_full_access() {
		let (app, _store) = mock::setup();
		let info = get_fx_permission_info(&app, &mock::user(7), &[TnId(2)], VIEW_ROLES).await.unwrap();
		assert_eq!(info.full_access_orgs, orgs(&["org3"]));
		assert_eq!(info.tenant_ids_full_access, BTreeSet::from([TnId(2)]));
	}

	#[tokio::test]
	async fn test_scope_hash() {
		let (app, _store) = mock::setup();
		let a = build_fx_permission_info(&app, &[TnId(1)]).await.unwrap();
		let b = build_fx_permission_info(&app, &[TnId(1), TnId(3)]).await.unwrap();
		let c = build_fx_permission_info(&app, &[TnId(2)]).await.unwrap();

		assert_eq!(a.scope_hash().len(), 64);
		// tenant 3 adds no org beyond tenant 1
		assert_eq!(a.scope_hash(), b.scope_hash());
		assert_ne!(a.scope_hash(), c.scope_hash());
	}
}

// vim: ts=4
