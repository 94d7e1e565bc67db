//! Paginated listing of enrolled learners

use serde::Serialize;
use serde_with::skip_serializing_none;
use std::collections::{BTreeMap, BTreeSet};

use crate::prelude::*;
use crate::scope::CourseFilter;
use insight_core::roles::RoleHolders;
use insight_types::learning_adapter::CERTIFICATE_DOWNLOADABLE;
use insight_types::user_adapter::ListUserOptions;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearnerEntry {
	pub user_id: UserId,
	pub username: Box<str>,
	pub email: Box<str>,
	pub name: Option<Box<str>>,
	pub courses_count: u64,
	pub certificates_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearnersPage {
	pub count: u64,
	pub page: u32,
	pub page_size: u32,
	pub results: Vec<LearnerEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
	pub page: u32,
	pub page_size: u32,
}

impl Pagination {
	/// Pages start at 1
	pub fn new(page: Option<u32>, page_size: Option<u32>) -> ClResult<Self> {
		let page = page.unwrap_or(1);
		let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
		if page == 0 || page_size == 0 || page_size > MAX_PAGE_SIZE {
			return Err(Error::invalid_input(
				"Invalid pagination",
				serde_json::json!({ "page": page, "page_size": page_size, "max_page_size": MAX_PAGE_SIZE }),
			));
		}
		Ok(Pagination { page, page_size })
	}

	pub fn offset(&self) -> u32 {
		(self.page - 1).saturating_mul(self.page_size)
	}
}

/// Learners with an active enrollment in scope, with their in-scope course and
/// certificate counts. Role holders of the course's org are not learners there.
pub async fn list_learners(
	app: &App,
	perm: &PermissionInfo,
	search: Option<&str>,
	pagination: Pagination,
) -> ClResult<LearnersPage> {
	let mut res =
		LearnersPage { count: 0, page: pagination.page, page_size: pagination.page_size, results: Vec::new() };
	let query = CourseFilter::default().query(perm);
	if query.is_empty() {
		return Ok(res);
	}

	let holders = RoleHolders::load(app, query.orgs()).await?;
	let mut courses: BTreeMap<UserId, BTreeSet<Box<str>>> = BTreeMap::new();
	for row in app.learning_adapter.list_enrollments(&query).await? {
		if !row.is_active || !row.user.is_plain_learner() {
			continue;
		}
		if OrgName::new(&row.org).is_none_or(|org| holders.has_org_row(row.user_id, &org)) {
			continue;
		}
		courses.entry(row.user_id).or_default().insert(row.course_id);
	}

	let mut certificates: BTreeMap<UserId, u64> = BTreeMap::new();
	for row in app.learning_adapter.list_certificates(&query, CERTIFICATE_DOWNLOADABLE).await? {
		if courses.get(&row.user_id).is_some_and(|c| c.contains(&row.course_id)) {
			*certificates.entry(row.user_id).or_default() += 1;
		}
	}

	let user_ids: Vec<UserId> = courses.keys().copied().collect();
	let search = search.map(str::trim).filter(|s| !s.is_empty());
	let opts = ListUserOptions { search, offset: pagination.offset(), limit: pagination.page_size };
	let (users, count) = app.user_adapter.list_users(&user_ids, &opts).await?;

	res.count = count;
	res.results = users
		.into_iter()
		.map(|user| LearnerEntry {
			courses_count: courses.get(&user.user_id).map_or(0, |c| c.len() as u64),
			certificates_count: certificates.get(&user.user_id).copied().unwrap_or_default(),
			user_id: user.user_id,
			username: user.username,
			email: user.email,
			name: user.name,
		})
		.collect();
	Ok(res)
}


// vim: ts=4
