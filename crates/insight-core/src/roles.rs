//! Role resolver
//!
//! Turns a user's course access role rows into the tenants and orgs the user may
//! see. Rows are validated first; malformed rows (for example a tenant role with
//! neither org nor course) never grant anything.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::cache::{CacheMode, KEY_PREFIX_COURSE_ACCESS_ROLES};
use crate::prelude::*;
use crate::tenants::{self, TenantsInfo};
use insight_types::role_adapter::{CreateRoleAssignment, RoleAssignment};
use insight_types::user_adapter::User;
use insight_types::utils::parse_id_list;

pub const COURSE_ONLY_ROLES: &[&str] = &["beta_testers", "ccx_coach", "finance_admin"];
pub const TENANT_ONLY_ROLES: &[&str] = &["org_course_creator_group"];
pub const TENANT_OR_COURSE_ROLES: &[&str] = &["data_researcher", "instructor", "staff"];
pub const GLOBAL_ROLES: &[&str] = &["course_creator_group", "support"];
pub const UNSUPPORTED_ROLES: &[&str] = &["library_user", "sales_admin"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
	CourseOnly,
	TenantOnly,
	TenantOrCourse,
	Global,
}

impl RoleKind {
	/// `None` for unknown and unsupported roles
	pub fn of(role: &str) -> Option<RoleKind> {
		if COURSE_ONLY_ROLES.contains(&role) {
			Some(RoleKind::CourseOnly)
		} else if TENANT_ONLY_ROLES.contains(&role) {
			Some(RoleKind::TenantOnly)
		} else if TENANT_OR_COURSE_ROLES.contains(&role) {
			Some(RoleKind::TenantOrCourse)
		} else if GLOBAL_ROLES.contains(&role) {
			Some(RoleKind::Global)
		} else {
			None
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
	None,
	AnyAccess,
	Elevated,
}

/// Checks the shape of a role row. `course_org` is compared only when present.
fn check_shape(role: &str, org: &str, course_id: Option<&str>, course_org: Option<&str>) -> ClResult<RoleKind> {
	let invalid = |msg: String| Err(Error::ValidationError(format!("invalid course access role: {}", msg)));
	let org = org.trim();
	let course_id = course_id.map(str::trim).filter(|c| !c.is_empty());

	let Some(kind) = RoleKind::of(role) else {
		return if UNSUPPORTED_ROLES.contains(&role) {
			invalid(format!("unsupported role ({})", role))
		} else {
			invalid(format!("invalid role ({})", role))
		};
	};

	match kind {
		RoleKind::CourseOnly if course_id.is_none() || org.is_empty() => {
			invalid(format!("role {} must have both course_id and org", role))
		}
		RoleKind::TenantOnly if course_id.is_some() || org.is_empty() => {
			invalid(format!("role {} must have an org without course_id", role))
		}
		RoleKind::TenantOrCourse if org.is_empty() => {
			invalid(format!("role {} must have at least an org", role))
		}
		RoleKind::Global if course_id.is_some() || !org.is_empty() => {
			invalid(format!("role {} must have neither org nor course_id", role))
		}
		_ => match (course_id, course_org) {
			(Some(_), Some(course_org)) if OrgName::key(course_org) != OrgName::key(org) => {
				invalid(format!("expected org value to be ({}), but got ({})", course_org, org))
			}
			_ => Ok(kind),
		},
	}
}

pub fn validate_role_assignment(row: &RoleAssignment) -> ClResult<RoleKind> {
	if row.course().is_some() && row.course_org.is_none() {
		return Err(Error::ValidationError(format!(
			"invalid course access role: course not found (id: {})",
			row.role_id
		)));
	}
	check_shape(&row.role, &row.org, row.course(), row.course_org.as_deref())
}

/// Access granted by one role
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoleAccess {
	pub orgs_full_access: BTreeSet<OrgName>,
	pub tenant_ids_full_access: BTreeSet<TnId>,
	/// Course id to the course's org
	pub course_limited_access: BTreeMap<Box<str>, OrgName>,
	pub orgs_of_courses: BTreeSet<OrgName>,
	pub tenant_ids: BTreeSet<TnId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserRoles {
	pub roles: BTreeMap<Box<str>, RoleAccess>,
	pub useless_entries_exist: bool,
}

impl UserRoles {
	/// `rows` must be ordered by role, org, course so org-wide rows come first
	pub fn build(rows: &[RoleAssignment], tenants: &TenantsInfo) -> Self {
		let mut res = UserRoles::default();

		for row in rows {
			let kind = match validate_role_assignment(row) {
				Ok(kind) => kind,
				Err(err) => {
					debug!(user_id = %row.user_id, role_id = row.role_id, "skipping role row: {}", err);
					res.useless_entries_exist = true;
					continue;
				}
			};
			let access = res.roles.entry(row.role.clone()).or_default();
			if kind == RoleKind::Global {
				continue;
			}

			match (row.course(), row.org_name()) {
				(None, Some(org)) => {
					let tn_ids = tenants.tenants_by_org(&org);
					access.tenant_ids_full_access.extend(tn_ids);
					access.tenant_ids.extend(tn_ids);
					access.orgs_full_access.insert(org);
				}
				(Some(course_id), Some(org)) => {
					if access.orgs_full_access.contains(&org) {
						res.useless_entries_exist = true;
						continue;
					}
					access.tenant_ids.extend(tenants.tenants_by_org(&org));
					access.course_limited_access.insert(course_id.into(), org.clone());
					access.orgs_of_courses.insert(org);
				}
				// unreachable after validation
				(_, None) => res.useless_entries_exist = true,
			}
		}
		res
	}

	pub fn has_role(&self, role: &str) -> bool {
		self.roles.contains_key(role)
	}

	/// Roles of the user that pass `roles_filter` (`None` keeps all)
	pub fn filtered<'a>(
		&'a self,
		roles_filter: Option<&'a [&'a str]>,
	) -> impl Iterator<Item = (&'a str, &'a RoleAccess)> + 'a {
		self.roles
			.iter()
			.filter(move |(role, _)| roles_filter.is_none_or(|filter| filter.contains(&&***role)))
			.map(|(role, access)| (&**role, access))
	}
}

fn roles_cache_key(user_id: UserId) -> String {
	format!("{}{}", KEY_PREFIX_COURSE_ACCESS_ROLES, user_id)
}

/// Role access of a user, cached until the user's roles change
pub async fn get_user_course_access_roles(app: &App, user_id: UserId) -> ClResult<UserRoles> {
	let key = roles_cache_key(user_id);
	app.cache
		.cached(&key, app.settings.cache_timeout_course_access_roles, CacheMode::Use, || async {
			let tenants = tenants::load_tenants_info(app).await?;
			let rows = app.role_adapter.list_user_roles(user_id).await?;
			Ok(UserRoles::build(&rows, &tenants))
		})
		.await
}

pub fn invalidate_user_roles(app: &App, user_id: UserId) {
	if app.cache.delete(&roles_cache_key(user_id)) {
		debug!(user_id = %user_id, "course access roles cache invalidated");
	}
}

/// Accessible tenants with their access level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessMap(pub BTreeMap<TnId, AccessLevel>);

impl AccessMap {
	pub fn level(&self, tn_id: TnId) -> AccessLevel {
		self.0.get(&tn_id).copied().unwrap_or(AccessLevel::None)
	}

	fn grant(&mut self, tn_id: TnId, level: AccessLevel) {
		let entry = self.0.entry(tn_id).or_insert(AccessLevel::None);
		*entry = (*entry).max(level);
	}

	pub fn tenant_ids(&self) -> Vec<TnId> {
		self.0.iter().filter(|(_, level)| **level > AccessLevel::None).map(|(tn_id, _)| *tn_id).collect()
	}

	pub fn is_empty(&self) -> bool {
		self.0.values().all(|level| *level == AccessLevel::None)
	}
}

/// Tenants the user may see.
///
/// Active platform staff and superusers get elevated access to every tenant
/// without a role scan. `roles_filter` limits which roles count: `None` counts
/// every role, an empty filter grants nothing.
pub async fn get_accessible_tenant_ids(
	app: &App,
	user: &User,
	roles_filter: Option<&[&str]>,
) -> ClResult<AccessMap> {
	let tenants = tenants::load_tenants_info(app).await?;
	let mut res = AccessMap::default();

	if user.is_system_staff() {
		for tn_id in &tenants.tenant_ids {
			res.grant(*tn_id, AccessLevel::Elevated);
		}
		return Ok(res);
	}
	if roles_filter.is_some_and(|filter| filter.is_empty()) {
		return Ok(res);
	}

	let user_roles = get_user_course_access_roles(app, user.user_id).await?;
	for (role, access) in user_roles.filtered(roles_filter) {
		let org_level = if app.settings.is_elevated_role(role) {
			AccessLevel::Elevated
		} else {
			AccessLevel::AnyAccess
		};
		if RoleKind::of(role) == Some(RoleKind::Global) {
			for tn_id in &tenants.tenant_ids {
				res.grant(*tn_id, org_level);
			}
			continue;
		}
		for tn_id in &access.tenant_ids_full_access {
			res.grant(*tn_id, org_level);
		}
		for tn_id in &access.tenant_ids {
			res.grant(*tn_id, AccessLevel::AnyAccess);
		}
	}
	Ok(res)
}

/// Validates a comma-separated tenant ID list against the user's access.
///
/// A missing or blank list means every accessible tenant.
pub async fn check_tenant_access(
	app: &App,
	user: &User,
	tenant_ids: Option<&str>,
	roles_filter: Option<&[&str]>,
) -> ClResult<Vec<TnId>> {
	let access = get_accessible_tenant_ids(app, user, roles_filter).await?;
	let requested = match tenant_ids.map(str::trim).filter(|s| !s.is_empty()) {
		None => return Ok(access.tenant_ids()),
		Some(raw) => parse_id_list::<u32>(raw).ok_or_else(|| {
			Error::invalid_input(
				"Invalid tenant IDs provided. It must be a comma-separated list of integers",
				serde_json::json!({ "tenant_ids": raw }),
			)
		})?,
	};
	let requested: BTreeSet<TnId> = requested.into_iter().map(TnId).collect();

	let tenants = tenants::load_tenants_info(app).await?;
	let wrong: Vec<TnId> = requested.iter().copied().filter(|tn_id| !tenants.is_valid(*tn_id)).collect();
	if !wrong.is_empty() {
		return Err(Error::invalid_input(
			"Invalid tenant IDs provided",
			serde_json::json!({ "tenant_ids": wrong }),
		));
	}

	let inaccessible: Vec<TnId> =
		requested.iter().copied().filter(|tn_id| access.level(*tn_id) == AccessLevel::None).collect();
	if !inaccessible.is_empty() {
		info!(user_id = %user.user_id, ?inaccessible, "tenant access denied");
		return Err(Error::PermissionDenied);
	}
	Ok(requested.into_iter().collect())
}

/// Role rows of many users over a set of orgs, for exclusion rules
#[derive(Debug, Clone, Default)]
pub struct RoleHolders {
	/// Users holding a global role
	global: HashSet<UserId>,
	/// (user, org) for org-wide rows of tenant-only and tenant-or-course roles
	org_wide: HashSet<(UserId, OrgName)>,
	/// (user, course) for course rows of course-capable roles
	course: HashSet<(UserId, Box<str>)>,
	/// (user, org) for any row recorded under the org
	any_row: HashSet<(UserId, OrgName)>,
}

impl RoleHolders {
	pub async fn load(app: &App, orgs: &[OrgName]) -> ClResult<Self> {
		let rows = app.role_adapter.list_role_holders(orgs).await?;
		Ok(Self::build(&rows))
	}

	pub fn build(rows: &[RoleAssignment]) -> Self {
		let mut res = RoleHolders::default();
		for row in rows {
			if let Some(org) = row.org_name() {
				res.any_row.insert((row.user_id, org));
			}
			let Ok(kind) = check_shape(&row.role, &row.org, row.course(), row.course_org.as_deref())
			else {
				continue;
			};
			match (kind, row.course(), row.org_name()) {
				(RoleKind::Global, _, _) => {
					res.global.insert(row.user_id);
				}
				(RoleKind::TenantOnly | RoleKind::TenantOrCourse, None, Some(org)) => {
					res.org_wide.insert((row.user_id, org));
				}
				(RoleKind::CourseOnly | RoleKind::TenantOrCourse, Some(course_id), Some(_)) => {
					res.course.insert((row.user_id, course_id.into()));
				}
				_ => {}
			}
		}
		res
	}

	/// User holds a role row recorded under `org`, valid or not
	pub fn has_org_row(&self, user_id: UserId, org: &OrgName) -> bool {
		self.any_row.contains(&(user_id, org.clone()))
	}

	/// User acts as staff for the course: a global role, an org-wide role on the
	/// course's org, or a role on the course itself
	pub fn is_course_staff(&self, user_id: UserId, org: &OrgName, course_id: &str) -> bool {
		self.global.contains(&user_id)
			|| self.org_wide.contains(&(user_id, org.clone()))
			|| self.course.contains(&(user_id, course_id.into()))
	}
}

/// Creates a role row. The user's cached roles are dropped before returning and
/// the user gets signup ties to the sites of every tenant owning the org.
pub async fn create_role_assignment(
	app: &App,
	role: &CreateRoleAssignment,
) -> ClResult<RoleAssignment> {
	check_shape(&role.role, &role.org, role.course_id.as_deref(), None)?;
	let created = app.role_adapter.create_role(role).await?;
	validate_role_assignment(&created)?;
	invalidate_user_roles(app, created.user_id);
	info!(user_id = %created.user_id, role = %created.role, org = %created.org, "role assignment created");

	if let Some(org) = created.org_name() {
		let tenants = tenants::load_tenants_info(app).await?;
		let sites: Vec<Box<str>> =
			tenants.tenants_by_org(&org).iter().filter_map(|tn_id| tenants.sites.get(tn_id).cloned()).collect();
		if !sites.is_empty() {
			let added = app.user_adapter.add_signup_sources(created.user_id, &sites).await?;
			debug!(user_id = %created.user_id, added, "signup sources added");
		}
	}
	Ok(created)
}

pub async fn delete_role_assignment(app: &App, role_id: i64) -> ClResult<RoleAssignment> {
	let deleted = app.role_adapter.delete_role(role_id).await?;
	invalidate_user_roles(app, deleted.user_id);
	info!(user_id = %deleted.user_id, role = %deleted.role, "role assignment deleted");
	Ok(deleted)
}


// vim: ts=4
