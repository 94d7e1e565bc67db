//! In-memory store for aggregator unit tests
//!
//! Tenant 1 owns ORG1 and ORG2 on s1.example.com, tenant 2 owns ORG3 (no courses).
//! Users: 1 superuser, 5 inactive, 3 staff of ORG1, 8 instructor of ORG2+2,
//! 4 holds a staff row without org. 6 only signed up, 7 has an inactive enrollment.
//! Enrollments are dated in early 2024; learner enrollments counted without
//! staff fall on 2024-01-10, 2024-02-03 and 2024-04-01.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::prelude::*;
use insight_core::AppBuilder;
use insight_types::course_query::{Annotation, CourseQuery};
use insight_types::learning_adapter::{
	CERTIFICATE_DOWNLOADABLE, CertificateRow, Course, EnrollmentRow, LearningAdapter, RatingRow,
};
use insight_types::role_adapter::{CreateRoleAssignment, RoleAdapter, RoleAssignment};
use insight_types::tenant_adapter::{OrgFilter, TenantConfig, TenantConfigAdapter};
use insight_types::user_adapter::{ListUserOptions, User, UserAdapter, UserFlags};

pub const ORG1_1: &str = "course-v1:ORG1+1+1";
pub const ORG1_9: &str = "course-v1:ORG1+9+9";
pub const ORG2_1: &str = "course-v1:ORG2+1+1";
pub const ORG2_2: &str = "course-v1:ORG2+2+2";

pub fn user(user_id: i64) -> User {
	User {
		user_id: UserId(user_id),
		username: format!("user{}", user_id).into(),
		email: format!("user{}@example.com", user_id).into(),
		name: (user_id == 2).then(|| "Jane Learner".into()),
		is_active: user_id != 5,
		is_staff: false,
		is_superuser: user_id == 1,
	}
}

fn flags(user_id: i64) -> UserFlags {
	let u = user(user_id);
	UserFlags { is_active: u.is_active, is_staff: u.is_staff, is_superuser: u.is_superuser }
}

/// Noon UTC of the given day
pub fn day(year: i32, month: u32, day: u32) -> Timestamp {
	let ts = NaiveDate::from_ymd_opt(year, month, day)
		.and_then(|date| date.and_hms_opt(12, 0, 0))
		.map(|dt| dt.and_utc().timestamp())
		.unwrap_or_default();
	Timestamp(ts)
}

fn course(course_id: &str, org: &str, effort: Option<&str>) -> Course {
	Course {
		course_id: course_id.into(),
		org: org.into(),
		display_name: None,
		start: None,
		end: None,
		self_paced: false,
		catalog_visibility: "both".into(),
		visible_to_staff_only: false,
		effort: effort.map(Into::into),
		certificates_count: None,
		enrollments_count: None,
	}
}

#[derive(Debug)]
pub struct TestStore {
	courses: Vec<Course>,
	enrollments: Vec<EnrollmentRow>,
	certificates: Vec<CertificateRow>,
	/// (course ID, rating)
	feedback: Vec<(&'static str, u32)>,
	roles: Vec<RoleAssignment>,
	signups: Vec<(UserId, Box<str>)>,
}

impl TestStore {
	fn new() -> Self {
		let mut ended = course(ORG2_2, "ORG2", Some("0:10"));
		ended.end = Some(Timestamp::from_now(-86400));
		let mut hidden = course(ORG1_9, "ORG1", None);
		hidden.catalog_visibility = "none".into();
		let courses =
			vec![course(ORG1_1, "ORG1", Some("2:30")), hidden, course(ORG2_1, "ORG2", None), ended];

		let org_of = |course_id: &str| if course_id.contains("ORG1") { "ORG1" } else { "ORG2" };
		let enrollment = |user_id: i64, course_id: &str, is_active: bool, created: Timestamp| EnrollmentRow {
			user_id: UserId(user_id),
			course_id: course_id.into(),
			org: org_of(course_id).into(),
			is_active,
			user: flags(user_id),
			created,
		};
		let certificate = |user_id: i64, course_id: &str, status: &str| CertificateRow {
			user_id: UserId(user_id),
			course_id: course_id.into(),
			org: org_of(course_id).into(),
			status: status.into(),
			user: flags(user_id),
		};
		let role = |role_id: i64, user_id: i64, role: &str, org: &str, course_id: Option<&str>| RoleAssignment {
			role_id,
			user_id: UserId(user_id),
			role: role.into(),
			org: org.into(),
			course_id: course_id.map(Into::into),
			course_org: course_id.map(|c| org_of(c).into()),
		};

		TestStore {
			courses,
			enrollments: vec![
				enrollment(1, ORG1_1, true, day(2024, 1, 10)),
				enrollment(2, ORG1_1, true, day(2024, 1, 10)),
				enrollment(2, ORG2_1, true, day(2024, 2, 3)),
				enrollment(3, ORG1_1, true, day(2024, 2, 20)),
				enrollment(3, ORG2_1, true, day(2024, 4, 1)),
				enrollment(5, ORG2_1, true, day(2024, 1, 15)),
				enrollment(7, ORG2_1, false, day(2024, 1, 15)),
				enrollment(8, ORG2_2, true, day(2024, 3, 31)),
			],
			certificates: vec![
				certificate(2, ORG1_1, CERTIFICATE_DOWNLOADABLE),
				certificate(3, ORG1_1, CERTIFICATE_DOWNLOADABLE),
				certificate(8, ORG2_2, CERTIFICATE_DOWNLOADABLE),
				certificate(2, ORG2_1, CERTIFICATE_DOWNLOADABLE),
				certificate(1, ORG2_1, CERTIFICATE_DOWNLOADABLE),
				certificate(5, ORG2_1, CERTIFICATE_DOWNLOADABLE),
				certificate(4, ORG2_1, "notpassing"),
			],
			feedback: vec![(ORG1_1, 5), (ORG1_1, 5), (ORG1_1, 0), (ORG1_9, 1), (ORG2_1, 4), (ORG2_2, 2)],
			roles: vec![
				role(1, 3, "staff", "ORG1", None),
				role(2, 8, "instructor", "ORG2", Some(ORG2_2)),
				role(3, 4, "staff", "", None),
			],
			signups: [1, 2, 6].into_iter().map(|u| (UserId(u), "s1.example.com".into())).collect(),
		}
	}

	fn course_ids(&self, query: &CourseQuery) -> Vec<&str> {
		self.courses.iter().filter(|c| query.matches(c)).map(|c| &*c.course_id).collect()
	}
}

#[async_trait]
impl TenantConfigAdapter for TestStore {
	async fn list_tenant_configs(&self) -> ClResult<Vec<TenantConfig>> {
		let config = |tn_id: u32, site: &str, filter: OrgFilter| TenantConfig {
			tn_id: TnId(tn_id),
			routes: vec![site.into()],
			lms_base: Some(site.into()),
			course_org_filter: Some(filter),
			dashboard_enabled: true,
			platform_name: None,
			logo_image_url: None,
		};
		Ok(vec![
			config(1, "s1.example.com", OrgFilter::Many(vec!["ORG1".into(), "ORG2".into()])),
			config(2, "s2.example.com", OrgFilter::One("ORG3".into())),
		])
	}
}

#[async_trait]
impl UserAdapter for TestStore {
	async fn read_user(&self, user_id: UserId) -> ClResult<User> {
		if (1..=9).contains(&user_id.0) { Ok(user(user_id.0)) } else { Err(Error::NotFound) }
	}

	async fn find_users_by_key(&self, key: &str) -> ClResult<Vec<User>> {
		Ok((1..=9).map(user).filter(|u| &*u.username == key).collect())
	}

	async fn list_users(
		&self,
		user_ids: &[UserId],
		opts: &ListUserOptions<'_>,
	) -> ClResult<(Vec<User>, u64)> {
		let search = opts.search.map(str::to_lowercase);
		let mut users: Vec<User> = user_ids
			.iter()
			.map(|id| user(id.0))
			.filter(|u| {
				search.as_deref().is_none_or(|s| {
					u.username.contains(s)
						|| u.email.contains(s) || u.name.as_deref().is_some_and(|n| n.to_lowercase().contains(s))
				})
			})
			.collect();
		users.sort_by_key(|u| u.user_id);
		let total = users.len() as u64;
		Ok((users.into_iter().skip(opts.offset as usize).take(opts.limit as usize).collect(), total))
	}

	async fn list_site_signups(&self, site: &str) -> ClResult<Vec<(UserId, UserFlags)>> {
		Ok(self.signups.iter().filter(|(_, s)| &**s == site).map(|(u, _)| (*u, flags(u.0))).collect())
	}

	async fn add_signup_sources(&self, _user_id: UserId, _sites: &[Box<str>]) -> ClResult<u32> {
		Ok(0)
	}
}

#[async_trait]
impl RoleAdapter for TestStore {
	async fn list_user_roles(&self, user_id: UserId) -> ClResult<Vec<RoleAssignment>> {
		Ok(self.roles.iter().filter(|r| r.user_id == user_id).cloned().collect())
	}

	async fn list_role_holders(&self, orgs: &[OrgName]) -> ClResult<Vec<RoleAssignment>> {
		Ok(self
			.roles
			.iter()
			.filter(|r| r.org.is_empty() || orgs.iter().any(|org| org.matches(&r.org)))
			.cloned()
			.collect())
	}

	async fn create_role(&self, _role: &CreateRoleAssignment) -> ClResult<RoleAssignment> {
		Err(Error::PermissionDenied)
	}

	async fn delete_role(&self, _role_id: i64) -> ClResult<RoleAssignment> {
		Err(Error::NotFound)
	}
}

#[async_trait]
impl LearningAdapter for TestStore {
	async fn list_courses(&self, query: &CourseQuery) -> ClResult<Vec<Course>> {
		Ok(self
			.courses
			.iter()
			.filter(|c| query.matches(c))
			.map(|c| {
				let mut c = c.clone();
				let count = |rows: usize| Some(rows as u64);
				if query.has_annotation(Annotation::CertificatesCount) {
					c.certificates_count = count(
						self.certificates
							.iter()
							.filter(|r| {
								r.course_id == c.course_id
									&& &*r.status == CERTIFICATE_DOWNLOADABLE && r.user.is_active
							})
							.count(),
					);
				}
				if query.has_annotation(Annotation::EnrollmentsCount) {
					c.enrollments_count = count(
						self.enrollments
							.iter()
							.filter(|r| r.course_id == c.course_id && r.is_active && r.user.is_active)
							.count(),
					);
				}
				c
			})
			.collect())
	}

	async fn list_enrollments(&self, query: &CourseQuery) -> ClResult<Vec<EnrollmentRow>> {
		let ids = self.course_ids(query);
		Ok(self.enrollments.iter().filter(|r| ids.contains(&&*r.course_id)).cloned().collect())
	}

	async fn list_certificates(&self, query: &CourseQuery, status: &str) -> ClResult<Vec<CertificateRow>> {
		let ids = self.course_ids(query);
		Ok(self
			.certificates
			.iter()
			.filter(|r| &*r.status == status && ids.contains(&&*r.course_id))
			.cloned()
			.collect())
	}

	async fn list_course_ratings(&self, query: &CourseQuery) -> ClResult<Vec<RatingRow>> {
		let mut rows: Vec<RatingRow> = Vec::new();
		for course in self.courses.iter().filter(|c| query.matches(c)) {
			for (_, rating) in self.feedback.iter().filter(|(id, r)| *id == &*course.course_id && *r > 0) {
				match rows.iter_mut().find(|row| row.course_id == course.course_id && row.rating == *rating) {
					Some(row) => row.count += 1,
					None => rows.push(RatingRow {
						course_id: course.course_id.clone(),
						org: course.org.clone(),
						rating: *rating,
						count: 1,
					}),
				}
			}
		}
		Ok(rows)
	}
}

pub fn setup() -> App {
	let store = Arc::new(TestStore::new());
	AppBuilder::new()
		.tenant_adapter(store.clone())
		.user_adapter(store.clone())
		.role_adapter(store.clone())
		.learning_adapter(store)
		.build()
		.unwrap()
}

// vim: ts=4
