//! In-memory adapters for unit tests
//!
//! Tenants: 1 (ORG1, ORG2), 2 (ORG3), 3 (org2); 4, 5 and 6 are misconfigured.
//! Users: 1 superuser, 2 staff, 5 inactive staff, the rest plain accounts.
//! Roles: user 3 is org-wide staff on ORG1 and instructor of one ORG2 course,
//! user 6 holds a staff row without org, user 7 holds the global `support` role,
//! user 11 is instructor of one ORG2 course and one ORG3 course.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::app::AppBuilder;
use crate::prelude::*;
use insight_types::course_query::CourseQuery;
use insight_types::learning_adapter::{CertificateRow, Course, EnrollmentRow, LearningAdapter, RatingRow};
use insight_types::role_adapter::{CreateRoleAssignment, RoleAdapter, RoleAssignment};
use insight_types::tenant_adapter::{OrgFilter, TenantConfig, TenantConfigAdapter};
use insight_types::user_adapter::{ListUserOptions, User, UserAdapter, UserFlags};

pub fn tenant_configs() -> Vec<TenantConfig> {
	let config = |tn_id: u32, routes: &[&str], lms_base: Option<&str>, filter: OrgFilter| TenantConfig {
		tn_id: TnId(tn_id),
		routes: routes.iter().map(|r| (*r).into()).collect(),
		lms_base: lms_base.map(Into::into),
		course_org_filter: Some(filter),
		dashboard_enabled: true,
		platform_name: Some(format!(" Tenant {} ", tn_id).into()),
		logo_image_url: None,
	};
	let many = |orgs: &[&str]| OrgFilter::Many(orgs.iter().map(|o| (*o).into()).collect());

	let mut disabled = config(6, &[], Some("s6.example.com"), many(&["ORG1"]));
	disabled.dashboard_enabled = false;

	vec![
		config(1, &["s1.example.com"], Some("s1.example.com"), many(&["ORG1", "ORG2"])),
		config(2, &["s2.example.com"], Some("https://s2.example.com"), OrgFilter::One("ORG3".into())),
		config(3, &["s3.example.com"], Some("s3.example.com"), OrgFilter::One("org2".into())),
		config(4, &["s4.example.com"], None, many(&["ORG1"])),
		config(5, &["s5.example.com"], Some("s5.example.com"), many(&[])),
		disabled,
	]
}

pub fn user(user_id: i64) -> User {
	let (username, email) = match user_id {
		8 => ("user8".to_string(), "conflict".to_string()),
		9 => ("conflict".to_string(), "user9@example.com".to_string()),
		_ => (format!("user{}", user_id), format!("user{}@example.com", user_id)),
	};
	User {
		user_id: UserId(user_id),
		username: username.into(),
		email: email.into(),
		name: None,
		is_active: user_id != 5,
		is_staff: user_id == 2 || user_id == 5,
		is_superuser: user_id == 1,
	}
}

fn course_org(course_id: &str) -> Option<Box<str>> {
	match course_id {
		"course-v1:ORG1+1+1" => Some("ORG1".into()),
		"course-v1:ORG2+1+1" => Some("ORG2".into()),
		"course-v1:ORG3+1+1" => Some("ORG3".into()),
		_ => None,
	}
}

#[derive(Debug, Default)]
pub struct MockStore {
	roles: Mutex<Vec<RoleAssignment>>,
	signups: Mutex<Vec<(UserId, Box<str>)>>,
	tenant_loads: AtomicUsize,
	role_reads: AtomicUsize,
}

impl MockStore {
	fn new() -> Self {
		let role = |role_id: i64, user_id: i64, role: &str, org: &str, course_id: Option<&str>| RoleAssignment {
			role_id,
			user_id: UserId(user_id),
			role: role.into(),
			org: org.into(),
			course_id: course_id.map(Into::into),
			course_org: course_id.and_then(course_org),
		};
		MockStore {
			roles: Mutex::new(vec![
				role(1, 3, "staff", "ORG1", None),
				role(2, 3, "instructor", "ORG2", Some("course-v1:ORG2+1+1")),
				role(3, 6, "staff", "", None),
				role(4, 7, "support", "", None),
				role(5, 11, "instructor", "ORG2", Some("course-v1:ORG2+1+1")),
				role(6, 11, "instructor", "ORG3", Some("course-v1:ORG3+1+1")),
			]),
			..MockStore::default()
		}
	}

	pub fn tenant_loads(&self) -> usize {
		self.tenant_loads.load(Ordering::SeqCst)
	}

	pub fn role_reads(&self) -> usize {
		self.role_reads.load(Ordering::SeqCst)
	}

	pub fn signup_sites(&self, user_id: UserId) -> Vec<String> {
		self.signups.lock().iter().filter(|(u, _)| *u == user_id).map(|(_, s)| s.to_string()).collect()
	}
}

#[async_trait]
impl TenantConfigAdapter for MockStore {
	async fn list_tenant_configs(&self) -> ClResult<Vec<TenantConfig>> {
		self.tenant_loads.fetch_add(1, Ordering::SeqCst);
		Ok(tenant_configs())
	}
}

#[async_trait]
impl UserAdapter for MockStore {
	async fn read_user(&self, user_id: UserId) -> ClResult<User> {
		if (1..=9).contains(&user_id.0) { Ok(user(user_id.0)) } else { Err(Error::NotFound) }
	}

	async fn find_users_by_key(&self, key: &str) -> ClResult<Vec<User>> {
		Ok((1..=9)
			.map(user)
			.filter(|u| &*u.username == key || u.email.eq_ignore_ascii_case(key))
			.collect())
	}

	async fn list_users(
		&self,
		user_ids: &[UserId],
		opts: &ListUserOptions<'_>,
	) -> ClResult<(Vec<User>, u64)> {
		let users: Vec<User> = user_ids
			.iter()
			.map(|id| user(id.0))
			.filter(|u| opts.search.is_none_or(|s| u.username.contains(s)))
			.collect();
		let total = users.len() as u64;
		Ok((users.into_iter().skip(opts.offset as usize).take(opts.limit as usize).collect(), total))
	}

	async fn list_site_signups(&self, site: &str) -> ClResult<Vec<(UserId, UserFlags)>> {
		Ok(self
			.signups
			.lock()
			.iter()
			.filter(|(_, s)| &**s == site)
			.map(|(user_id, _)| {
				let u = user(user_id.0);
				(*user_id, UserFlags { is_active: u.is_active, is_staff: u.is_staff, is_superuser: u.is_superuser })
			})
			.collect())
	}

	async fn add_signup_sources(&self, user_id: UserId, sites: &[Box<str>]) -> ClResult<u32> {
		let mut signups = self.signups.lock();
		let mut added = 0;
		for site in sites {
			if !signups.iter().any(|(u, s)| *u == user_id && s == site) {
				signups.push((user_id, site.clone()));
				added += 1;
			}
		}
		Ok(added)
	}
}

#[async_trait]
impl RoleAdapter for MockStore {
	async fn list_user_roles(&self, user_id: UserId) -> ClResult<Vec<RoleAssignment>> {
		self.role_reads.fetch_add(1, Ordering::SeqCst);
		let mut rows: Vec<RoleAssignment> =
			self.roles.lock().iter().filter(|r| r.user_id == user_id).cloned().collect();
		rows.sort_by(|a, b| {
			(&a.role, a.org.to_lowercase(), &a.course_id).cmp(&(&b.role, b.org.to_lowercase(), &b.course_id))
		});
		Ok(rows)
	}

	async fn list_role_holders(&self, orgs: &[OrgName]) -> ClResult<Vec<RoleAssignment>> {
		Ok(self
			.roles
			.lock()
			.iter()
			.filter(|r| r.org.trim().is_empty() || orgs.iter().any(|org| org.matches(&r.org)))
			.cloned()
			.collect())
	}

	async fn create_role(&self, role: &CreateRoleAssignment) -> ClResult<RoleAssignment> {
		let mut roles = self.roles.lock();
		let row = RoleAssignment {
			role_id: roles.iter().map(|r| r.role_id).max().unwrap_or_default() + 1,
			user_id: role.user_id,
			role: role.role.clone(),
			org: role.org.clone(),
			course_id: role.course_id.clone(),
			course_org: role.course_id.as_deref().and_then(course_org),
		};
		roles.push(row.clone());
		Ok(row)
	}

	async fn delete_role(&self, role_id: i64) -> ClResult<RoleAssignment> {
		let mut roles = self.roles.lock();
		let pos = roles.iter().position(|r| r.role_id == role_id).ok_or(Error::NotFound)?;
		Ok(roles.remove(pos))
	}
}

#[async_trait]
impl LearningAdapter for MockStore {
	async fn list_courses(&self, _query: &CourseQuery) -> ClResult<Vec<Course>> {
		Ok(Vec::new())
	}

	async fn list_enrollments(&self, _query: &CourseQuery) -> ClResult<Vec<EnrollmentRow>> {
		Ok(Vec::new())
	}

	async fn list_certificates(&self, _query: &CourseQuery, _status: &str) -> ClResult<Vec<CertificateRow>> {
		Ok(Vec::new())
	}

	async fn list_course_ratings(&self, _query: &CourseQuery) -> ClResult<Vec<RatingRow>> {
		Ok(Vec::new())
	}
}

pub fn setup() -> (App, Arc<MockStore>) {
	let store = Arc::new(MockStore::new());
	let app = AppBuilder::new()
		.tenant_adapter(store.clone())
		.user_adapter(store.clone())
		.role_adapter(store.clone())
		.learning_adapter(store.clone())
		.build()
		.unwrap();
	(app, store)
}

// vim: ts=4
