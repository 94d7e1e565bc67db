//! Adapter for the role-assignment store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt::Debug;

use crate::prelude::*;

/// A course access role row: (user, role, org and/or course).
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoleAssignment {
	pub role_id: i64,
	pub user_id: UserId,
	pub role: Box<str>,
	/// Organization as recorded, may be empty
	pub org: Box<str>,
	pub course_id: Option<Box<str>>,
	/// Org of the referenced course, if the course exists
	pub course_org: Option<Box<str>>,
}

impl RoleAssignment {
	pub fn org_name(&self) -> Option<OrgName> {
		OrgName::new(&self.org)
	}

	pub fn course(&self) -> Option<&str> {
		self.course_id.as_deref().filter(|c| !c.trim().is_empty())
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoleAssignment {
	pub user_id: UserId,
	pub role: Box<str>,
	#[serde(default)]
	pub org: Box<str>,
	pub course_id: Option<Box<str>>,
}

#[async_trait]
pub trait RoleAdapter: Debug + Send + Sync {
	/// All role rows of a user, ordered by role, org, course
	async fn list_user_roles(&self, user_id: UserId) -> ClResult<Vec<RoleAssignment>>;

	/// Role rows whose org is one of `orgs` (case-insensitive), plus rows with an
	/// empty org (global roles).
	async fn list_role_holders(&self, orgs: &[OrgName]) -> ClResult<Vec<RoleAssignment>>;

	async fn create_role(&self, role: &CreateRoleAssignment) -> ClResult<RoleAssignment>;

	/// Deletes a role row and returns it
	async fn delete_role(&self, role_id: i64) -> ClResult<RoleAssignment>;
}

// vim: ts=4
