//! Reference dataset shared by the integration tests
//!
//! Eight tenant configurations, five of them valid (1, 2, 3, 7, 8). Courses are
//! named `course-v1:<ORG>+<n>+<n>`.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use insight_core::settings::InsightSettings;
use insight_core::{App, AppBuilder};
use insight_store_adapter_sqlite::StoreAdapterSqlite;
use insight_types::course_query::CourseQuery;
use insight_types::learning_adapter::{CertificateRow, Course, EnrollmentRow, LearningAdapter, RatingRow};
use insight_types::prelude::*;
use insight_types::release::PlatformRelease;
use insight_types::role_adapter::{CreateRoleAssignment, RoleAdapter, RoleAssignment};
use insight_types::tenant_adapter::{OrgFilter, TenantConfig};
use insight_types::user_adapter::{User, UserAdapter};

pub const USERS_COUNT: i64 = 70;
pub const SUPER_USERS: &[i64] = &[1, 60];
pub const STAFF_USERS: &[i64] = &[2, 60];
pub const INACTIVE_USERS: &[i64] = &[61, 62, 63];

const DAY: i64 = 24 * 60 * 60;

/// Course counts per org. ORG6 belongs to no tenant.
const COURSES: &[(&str, u32)] = &[("ORG1", 5), ("ORG2", 7), ("ORG3", 3), ("ORG4", 1), ("ORG6", 1), ("ORG8", 2)];

/// (org, course index, user IDs)
const ENROLLMENTS: &[(&str, u32, &[i64])] = &[
	("ORG1", 1, &[4, 5]),
	("ORG1", 2, &[3]),
	("ORG1", 4, &[4]),
	("ORG1", 5, &[1, 2, 3, 4, 15, 21, 40]),
	("ORG2", 1, &[2]),
	("ORG2", 3, &[1, 2, 3]),
	("ORG2", 4, &[4, 5, 21, 22, 23, 24, 25]),
	("ORG2", 5, &[21, 22, 23, 24, 25]),
	("ORG2", 6, &[28, 29, 30, 31, 32]),
	("ORG2", 7, &[15, 38, 39, 40, 41]),
	("ORG3", 1, &[10, 40, 41, 42, 43, 44]),
	("ORG3", 2, &[45, 46, 47, 48, 49]),
	("ORG3", 3, &[7, 8, 9, 10, 11, 12]),
	("ORG4", 1, &[1, 2, 15, 16, 17, 18]),
	("ORG6", 1, &[30, 31, 32, 41, 42]),
	("ORG8", 1, &[47, 48, 49, 52]),
	("ORG8", 2, &[23, 52, 53, 54]),
];

/// Downloadable certificates: (org, course index, user IDs)
const CERTIFICATES: &[(&str, u32, &[i64])] = &[
	("ORG1", 5, &[2, 3, 4, 40]),
	("ORG2", 4, &[4, 5, 24, 25]),
	("ORG2", 5, &[21, 24, 25]),
	("ORG2", 7, &[15, 40, 41]),
	("ORG3", 1, &[42, 43, 44]),
	("ORG3", 2, &[48, 49]),
	("ORG3", 3, &[8, 9]),
	("ORG6", 1, &[30, 42]),
	("ORG8", 1, &[49, 52]),
];

/// Course feedback ratings: (org, course index, ratings). 0 is an unrated entry.
const FEEDBACK: &[(&str, u32, &[u32])] = &[
	("ORG1", 1, &[5, 4, 0]),
	("ORG1", 5, &[3]),
	("ORG2", 4, &[5, 5, 1]),
	("ORG3", 1, &[2, 4]),
	("ORG6", 1, &[5]),
];

/// Org-wide roles: (role, org, user IDs)
const ORG_ROLES: &[(&str, &str, &[i64])] = &[
	("staff", "ORG1", &[3]),
	("staff", "ORG2", &[8, 9]),
	("staff", "ORG3", &[9, 18]),
	("staff", "ORG4", &[10, 23]),
	("staff", "ORG5", &[23]),
	("org_course_creator_group", "ORG1", &[4]),
	("org_course_creator_group", "ORG2", &[1, 2, 4, 9]),
	("org_course_creator_group", "ORG3", &[4, 10, 11]),
	("org_course_creator_group", "ORG4", &[23, 48]),
	("org_course_creator_group", "ORG5", &[23]),
	("org_course_creator_group", "ORG8", &[23]),
];

/// Rows with neither org nor course, they grant nothing
pub const NO_ORG_ROLES: &[(&str, &[i64])] =
	&[("staff", &[10, 30, 40, 41]), ("org_course_creator_group", &[24, 40, 42])];

/// Course-level role of user 70, the only one in the dataset
pub const LIMITED_INSTRUCTOR: i64 = 70;
pub const LIMITED_COURSE: &str = "course-v1:ORG3+1+1";

const SIGNUPS: &[(&str, &[i64])] = &[
	("s1.sample.com", &[1, 2, 3, 4, 5]),
	("s2.sample.com", &[4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]),
	("s3.sample.com", &[15, 16, 17, 18, 19, 20]),
	("s4.sample.com", &[21, 22, 23, 24, 25, 26, 27]),
	("s5.sample.com", &[21, 22, 23, 24, 25, 26, 27]),
	("s6.sample.com", &[28, 29, 30, 31, 32, 33, 34, 35, 36, 37]),
	("s7.sample.com", &[15, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50]),
	("s8.sample.com", &[47, 48, 49, 50, 51, 52, 53, 54, 55]),
	("dah.sample.com", &[1, 2, 3, 4, 5]),
];

pub fn course_id(org: &str, index: u32) -> String {
	format!("course-v1:{}+{}+{}", org, index, index)
}

fn tenant(
	tn_id: u32,
	route: Option<&str>,
	lms_base: Option<&str>,
	filter: OrgFilter,
) -> TenantConfig {
	TenantConfig {
		tn_id: TnId(tn_id),
		routes: route.into_iter().map(Into::into).collect(),
		lms_base: lms_base.map(Into::into),
		course_org_filter: Some(filter),
		dashboard_enabled: true,
		platform_name: Some(format!("Platform {}", tn_id).into()),
		logo_image_url: None,
	}
}

fn many(orgs: &[&str]) -> OrgFilter {
	OrgFilter::Many(orgs.iter().map(|org| (*org).into()).collect())
}

pub fn tenant_configs() -> Vec<TenantConfig> {
	vec![
		tenant(1, Some("s1.sample.com"), Some("s1.sample.com"), many(&["ORG1", "ORG2"])),
		tenant(2, Some("s2.sample.com"), Some("s2.sample.com"), many(&["ORG3", "ORG8"])),
		tenant(3, Some("s3.sample.com"), Some("https://s3.sample.com"), many(&["ORG4", "ORG5"])),
		// no lms base
		tenant(4, Some("s4.sample.com"), None, many(&["ORG1", "ORG2"])),
		// no orgs
		tenant(5, Some("s5.sample.com"), Some("s5.sample.com"), many(&[])),
		// no route
		tenant(6, None, Some("s6.sample.com"), many(&["ORG2"])),
		tenant(7, Some("s7.sample.com"), Some("s7.sample.com"), OrgFilter::One("ORG3".into())),
		tenant(8, Some("s8.sample.com"), Some("s8.sample.com"), many(&["ORG8"])),
	]
}

pub fn user(user_id: i64) -> User {
	User {
		user_id: UserId(user_id),
		username: format!("user{}", user_id).into(),
		email: format!("user{}@example.com", user_id).into(),
		name: Some(format!("User {}", user_id).into()),
		is_active: !INACTIVE_USERS.contains(&user_id),
		is_staff: STAFF_USERS.contains(&user_id),
		is_superuser: SUPER_USERS.contains(&user_id),
	}
}

pub fn course(org: &str, index: u32) -> Course {
	let id = course_id(org, index);
	let future = Timestamp::from_now(DAY);
	let past = Timestamp::from_now(-DAY);
	let (start, end) = match id.as_str() {
		"course-v1:ORG1+1+1" => (Some(future), None),
		"course-v1:ORG1+2+2" => (Some(future), Some(Timestamp::from_now(10 * DAY))),
		"course-v1:ORG1+3+3" => (None, Some(Timestamp::from_now(10 * DAY))),
		"course-v1:ORG2+1+1" => (Some(Timestamp::from_now(-10 * DAY)), None),
		"course-v1:ORG2+2+2" => (Some(Timestamp::from_now(-10 * DAY)), Some(Timestamp::from_now(10 * DAY))),
		"course-v1:ORG2+3+3" | "course-v1:ORG2+4+4" => (None, Some(past)),
		"course-v1:ORG2+5+5" => (Some(Timestamp::from_now(-10 * DAY)), Some(past)),
		_ => (None, None),
	};
	Course {
		self_paced: id == "course-v1:ORG1+4+4",
		course_id: id.into(),
		org: org.into(),
		display_name: Some(format!("Course {} of {}", index, org).into()),
		start,
		end,
		catalog_visibility: "both".into(),
		visible_to_staff_only: false,
		effort: None,
		certificates_count: None,
		enrollments_count: None,
	}
}

/// Fills an empty store with the reference dataset
pub async fn seed(store: &StoreAdapterSqlite) -> ClResult<()> {
	let configs = tenant_configs();
	for config in &configs {
		store.create_tenant(config).await?;
	}
	for user_id in 1..=USERS_COUNT {
		store.create_user(&user(user_id)).await?;
	}
	for (site, users) in SIGNUPS {
		for user_id in *users {
			store.add_signup_sources(UserId(*user_id), &[(*site).into()]).await?;
		}
	}
	for (org, count) in COURSES {
		for index in 1..=*count {
			store.create_course(&course(org, index)).await?;
		}
	}

	for (role, org, users) in ORG_ROLES {
		for user_id in *users {
			let row = CreateRoleAssignment {
				user_id: UserId(*user_id),
				role: (*role).into(),
				org: (*org).into(),
				course_id: None,
			};
			store.create_role(&row).await?;
		}
	}
	for (role, users) in NO_ORG_ROLES {
		for user_id in *users {
			let row = CreateRoleAssignment {
				user_id: UserId(*user_id),
				role: (*role).into(),
				org: "".into(),
				course_id: None,
			};
			store.create_role(&row).await?;
		}
	}
	let row = CreateRoleAssignment {
		user_id: UserId(LIMITED_INSTRUCTOR),
		role: "instructor".into(),
		org: "ORG3".into(),
		course_id: Some(LIMITED_COURSE.into()),
	};
	store.create_role(&row).await?;

	// enrolled users are tied to the site of every tenant configured with the org
	for (org, index, users) in ENROLLMENTS {
		let sites: Vec<Box<str>> = configs
			.iter()
			.filter(|config| config.tn_id != TnId(6))
			.filter(|config| {
				config.course_org_filter.as_ref().is_some_and(|f| f.to_orgs().iter().any(|o| o.matches(org)))
			})
			.filter_map(|config| config.routes.first().cloned())
			.collect();
		for user_id in *users {
			store.create_enrollment(UserId(*user_id), &course_id(org, *index), true).await?;
			store.add_signup_sources(UserId(*user_id), &sites).await?;
		}
	}
	for (org, index, users) in CERTIFICATES {
		for user_id in *users {
			store.create_certificate(UserId(*user_id), &course_id(org, *index), "downloadable").await?;
		}
	}
	for (org, index, ratings) in FEEDBACK {
		for (user_id, rating) in (20..).zip(ratings.iter()) {
			store.create_course_feedback(UserId(user_id), &course_id(org, *index), *rating).await?;
		}
	}
	Ok(())
}

/// Counts calls reaching the learning and role stores
#[derive(Debug)]
pub struct CountingStore {
	inner: Arc<StoreAdapterSqlite>,
	pub learning_calls: AtomicUsize,
	pub user_role_calls: AtomicUsize,
	pub role_holder_calls: AtomicUsize,
}

impl CountingStore {
	pub fn learning_calls(&self) -> usize {
		self.learning_calls.load(Ordering::SeqCst)
	}

	pub fn user_role_calls(&self) -> usize {
		self.user_role_calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl LearningAdapter for CountingStore {
	async fn list_courses(&self, query: &CourseQuery) -> ClResult<Vec<Course>> {
		self.learning_calls.fetch_add(1, Ordering::SeqCst);
		self.inner.list_courses(query).await
	}

	async fn list_enrollments(&self, query: &CourseQuery) -> ClResult<Vec<EnrollmentRow>> {
		self.learning_calls.fetch_add(1, Ordering::SeqCst);
		self.inner.list_enrollments(query).await
	}

	async fn list_certificates(&self, query: &CourseQuery, status: &str) -> ClResult<Vec<CertificateRow>> {
		self.learning_calls.fetch_add(1, Ordering::SeqCst);
		self.inner.list_certificates(query, status).await
	}

	async fn list_course_ratings(&self, query: &CourseQuery) -> ClResult<Vec<RatingRow>> {
		self.learning_calls.fetch_add(1, Ordering::SeqCst);
		self.inner.list_course_ratings(query).await
	}
}

#[async_trait]
impl RoleAdapter for CountingStore {
	async fn list_user_roles(&self, user_id: UserId) -> ClResult<Vec<RoleAssignment>> {
		self.user_role_calls.fetch_add(1, Ordering::SeqCst);
		self.inner.list_user_roles(user_id).await
	}

	async fn list_role_holders(&self, orgs: &[OrgName]) -> ClResult<Vec<RoleAssignment>> {
		self.role_holder_calls.fetch_add(1, Ordering::SeqCst);
		self.inner.list_role_holders(orgs).await
	}

	async fn create_role(&self, role: &CreateRoleAssignment) -> ClResult<RoleAssignment> {
		self.inner.create_role(role).await
	}

	async fn delete_role(&self, role_id: i64) -> ClResult<RoleAssignment> {
		self.inner.delete_role(role_id).await
	}
}

pub struct Fixture {
	pub app: App,
	pub store: Arc<StoreAdapterSqlite>,
	pub counter: Arc<CountingStore>,
	_tmp: TempDir,
}

pub async fn open_store(tmp: &TempDir) -> StoreAdapterSqlite {
	StoreAdapterSqlite::new(tmp.path().join("store.db"), PlatformRelease::Sumac)
		.await
		.expect("Failed to open store")
}

/// A seeded store behind a fresh app
pub async fn setup() -> Fixture {
	let tmp = TempDir::new().expect("Failed to create temp directory");
	let store = Arc::new(open_store(&tmp).await);
	seed(&store).await.expect("Failed to seed store");

	let counter = Arc::new(CountingStore {
		inner: store.clone(),
		learning_calls: AtomicUsize::new(0),
		user_role_calls: AtomicUsize::new(0),
		role_holder_calls: AtomicUsize::new(0),
	});
	let app = AppBuilder::new()
		.settings(InsightSettings::default())
		.tenant_adapter(store.clone())
		.user_adapter(store.clone())
		.role_adapter(counter.clone())
		.learning_adapter(counter.clone())
		.build()
		.expect("Failed to build app");

	Fixture { app, store, counter, _tmp: tmp }
}

// vim: ts=4
