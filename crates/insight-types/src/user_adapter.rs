//! Adapter for the user directory of the hosting platform.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt::Debug;

use crate::prelude::*;

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
	pub user_id: UserId,
	pub username: Box<str>,
	pub email: Box<str>,
	pub name: Option<Box<str>>,
	pub is_active: bool,
	pub is_staff: bool,
	pub is_superuser: bool,
}

impl User {
	/// Active platform-wide staff or superuser
	pub fn is_system_staff(&self) -> bool {
		self.is_active && (self.is_staff || self.is_superuser)
	}
}

/// Account flags joined onto enrollment, certificate and signup rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserFlags {
	pub is_active: bool,
	pub is_staff: bool,
	pub is_superuser: bool,
}

impl UserFlags {
	/// Active, non-staff, non-superuser account
	pub fn is_plain_learner(&self) -> bool {
		self.is_active && !self.is_staff && !self.is_superuser
	}
}

#[derive(Debug, Clone, Default)]
pub struct ListUserOptions<'a> {
	/// Case-insensitive substring match on username, email or name
	pub search: Option<&'a str>,
	pub offset: u32,
	pub limit: u32,
}

#[async_trait]
pub trait UserAdapter: Debug + Send + Sync {
	/// Reads a user by ID, `Error::NotFound` if missing
	async fn read_user(&self, user_id: UserId) -> ClResult<User>;

	/// Users whose username or email (case-insensitive) equals `key`
	async fn find_users_by_key(&self, key: &str) -> ClResult<Vec<User>>;

	/// Users among `user_ids` matching the search, ordered by ID, paginated.
	/// Returns the page and the total number of matches.
	async fn list_users(
		&self,
		user_ids: &[UserId],
		opts: &ListUserOptions<'_>,
	) -> ClResult<(Vec<User>, u64)>;

	/// Users with a signup-source record at `site`
	async fn list_site_signups(&self, site: &str) -> ClResult<Vec<(UserId, UserFlags)>>;

	/// Records signup-source ties for the sites the user is not yet tied to.
	/// Returns the number of records created.
	async fn add_signup_sources(&self, user_id: UserId, sites: &[Box<str>]) -> ClResult<u32>;
}

// vim: ts=4
