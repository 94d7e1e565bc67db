//! SQLite store adapter for Insight.
//!
//! Implements the tenant, user, role and learning adapters over a single
//! SQLite database laid out like the hosting platform's tables. Besides the
//! adapter traits it exposes import methods used to seed a database.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod learning;
mod role;
mod schema;
mod tables;
mod tenant;
mod user;
mod utils;

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;

use insight_types::course_query::CourseQuery;
use insight_types::learning_adapter::{CertificateRow, Course, EnrollmentRow, LearningAdapter, RatingRow};
use insight_types::prelude::*;
use insight_types::release::PlatformRelease;
use insight_types::role_adapter::{CreateRoleAssignment, RoleAdapter, RoleAssignment};
use insight_types::tenant_adapter::{TenantConfig, TenantConfigAdapter};
use insight_types::user_adapter::{ListUserOptions, User, UserAdapter, UserFlags};

use crate::tables::TableMap;

#[derive(Debug)]
pub struct StoreAdapterSqlite {
	db: SqlitePool,
	tables: TableMap,
}

impl StoreAdapterSqlite {
	/// Opens (and creates if missing) the database file at `path`
	pub async fn new(path: impl AsRef<Path>, release: PlatformRelease) -> ClResult<Self> {
		let path = path.as_ref();
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent).await?;
		}

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path)
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| error!("DB: cannot open {}: {:#?}", path.display(), err))
			.map_err(|err| Error::ConnectionError(format!("cannot open {}: {}", path.display(), err)))?;

		let tables = TableMap::for_release(release);
		schema::init_db(&db, &tables)
			.await
			.inspect_err(|err| error!("DB: schema init failed: {:#?}", err))
			.map_err(|_| Error::DbError)?;
		info!(path = %path.display(), release = release.as_str(), "store database ready");

		Ok(Self { db, tables })
	}

	// Import
	//********
	pub async fn create_tenant(&self, tenant: &TenantConfig) -> ClResult<()> {
		tenant::create(&self.db, &self.tables, tenant).await
	}

	/// Overwrites the stored `course_org_filter` with a raw JSON text
	pub async fn set_raw_org_filter(&self, tn_id: TnId, raw: Option<&str>) -> ClResult<()> {
		tenant::set_raw_org_filter(&self.db, &self.tables, tn_id, raw).await
	}

	pub async fn create_user(&self, user: &User) -> ClResult<()> {
		user::create(&self.db, &self.tables, user).await
	}

	pub async fn create_course(&self, course: &Course) -> ClResult<()> {
		learning::create_course(&self.db, &self.tables, course).await
	}

	pub async fn create_enrollment(&self, user_id: UserId, course_id: &str, is_active: bool) -> ClResult<()> {
		learning::create_enrollment(&self.db, &self.tables, user_id, course_id, is_active).await
	}

	pub async fn create_certificate(&self, user_id: UserId, course_id: &str, status: &str) -> ClResult<()> {
		learning::create_certificate(&self.db, &self.tables, user_id, course_id, status).await
	}

	/// Records one course feedback entry; rating 0 means no rating given
	pub async fn create_course_feedback(&self, user_id: UserId, course_id: &str, rating: u32) -> ClResult<()> {
		learning::create_course_feedback(&self.db, &self.tables, user_id, course_id, rating).await
	}
}

#[async_trait]
impl TenantConfigAdapter for StoreAdapterSqlite {
	async fn list_tenant_configs(&self) -> ClResult<Vec<TenantConfig>> {
		tenant::list(&self.db, &self.tables).await
	}
}

#[async_trait]
impl UserAdapter for StoreAdapterSqlite {
	async fn read_user(&self, user_id: UserId) -> ClResult<User> {
		user::read(&self.db, &self.tables, user_id).await
	}

	async fn find_users_by_key(&self, key: &str) -> ClResult<Vec<User>> {
		user::find_by_key(&self.db, &self.tables, key).await
	}

	async fn list_users(&self, user_ids: &[UserId], opts: &ListUserOptions<'_>) -> ClResult<(Vec<User>, u64)> {
		user::list(&self.db, &self.tables, user_ids, opts).await
	}

	async fn list_site_signups(&self, site: &str) -> ClResult<Vec<(UserId, UserFlags)>> {
		user::list_site_signups(&self.db, &self.tables, site).await
	}

	async fn add_signup_sources(&self, user_id: UserId, sites: &[Box<str>]) -> ClResult<u32> {
		user::add_signup_sources(&self.db, &self.tables, user_id, sites).await
	}
}

#[async_trait]
impl RoleAdapter for StoreAdapterSqlite {
	async fn list_user_roles(&self, user_id: UserId) -> ClResult<Vec<RoleAssignment>> {
		role::list_user_roles(&self.db, &self.tables, user_id).await
	}

	async fn list_role_holders(&self, orgs: &[OrgName]) -> ClResult<Vec<RoleAssignment>> {
		role::list_role_holders(&self.db, &self.tables, orgs).await
	}

	async fn create_role(&self, role: &CreateRoleAssignment) -> ClResult<RoleAssignment> {
		role::create(&self.db, &self.tables, role).await
	}

	async fn delete_role(&self, role_id: i64) -> ClResult<RoleAssignment> {
		role::delete(&self.db, &self.tables, role_id).await
	}
}

#[async_trait]
impl LearningAdapter for StoreAdapterSqlite {
	async fn list_courses(&self, query: &CourseQuery) -> ClResult<Vec<Course>> {
		learning::list_courses(&self.db, &self.tables, query).await
	}

	async fn list_enrollments(&self, query: &CourseQuery) -> ClResult<Vec<EnrollmentRow>> {
		learning::list_enrollments(&self.db, &self.tables, query).await
	}

	async fn list_certificates(&self, query: &CourseQuery, status: &str) -> ClResult<Vec<CertificateRow>> {
		learning::list_certificates(&self.db, &self.tables, query, status).await
	}

	async fn list_course_ratings(&self, query: &CourseQuery) -> ClResult<Vec<RatingRow>> {
		learning::list_course_ratings(&self.db, &self.tables, query).await
	}
}

// vim: ts=4
