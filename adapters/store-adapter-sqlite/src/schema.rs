//! Database schema initialization
//!
//! Course and role rows carry an `org_key` column written with
//! [`OrgName::key`](insight_types::types::OrgName::key). SQLite's `lower()`
//! folds ASCII only, so org matching always goes through that column.

use sqlx::SqlitePool;

use crate::tables::TableMap;

/// Creates every table and index that does not exist yet
pub(crate) async fn init_db(db: &SqlitePool, t: &TableMap) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Tenants
	//*********
	sqlx::query(&format!(
		"CREATE TABLE IF NOT EXISTS {} (
		tn_id integer NOT NULL,
		lms_base text,
		course_org_filter text,
		dashboard_enabled boolean NOT NULL DEFAULT 1,
		platform_name text,
		logo_image_url text,
		PRIMARY KEY(tn_id)
	)",
		t.tenants
	))
	.execute(&mut *tx)
	.await?;

	sqlx::query(&format!(
		"CREATE TABLE IF NOT EXISTS {} (
		domain text NOT NULL,
		tn_id integer NOT NULL,
		PRIMARY KEY(domain)
	)",
		t.routes
	))
	.execute(&mut *tx)
	.await?;
	sqlx::query(&format!("CREATE INDEX IF NOT EXISTS idx_routes_tnid ON {}(tn_id)", t.routes))
		.execute(&mut *tx)
		.await?;

	// Users
	//*******
	sqlx::query(&format!(
		"CREATE TABLE IF NOT EXISTS {} (
		user_id integer NOT NULL,
		username text NOT NULL,
		email text NOT NULL,
		name text,
		is_active boolean NOT NULL DEFAULT 1,
		is_staff boolean NOT NULL DEFAULT 0,
		is_superuser boolean NOT NULL DEFAULT 0,
		PRIMARY KEY(user_id)
	)",
		t.users
	))
	.execute(&mut *tx)
	.await?;
	sqlx::query(&format!("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON {}(username)", t.users))
		.execute(&mut *tx)
		.await?;
	sqlx::query(&format!("CREATE INDEX IF NOT EXISTS idx_users_email ON {}(lower(email))", t.users))
		.execute(&mut *tx)
		.await?;

	sqlx::query(&format!(
		"CREATE TABLE IF NOT EXISTS {} (
		user_id integer NOT NULL,
		site text NOT NULL,
		PRIMARY KEY(user_id, site)
	)",
		t.signup_sources
	))
	.execute(&mut *tx)
	.await?;
	sqlx::query(&format!("CREATE INDEX IF NOT EXISTS idx_signup_sources_site ON {}(site)", t.signup_sources))
		.execute(&mut *tx)
		.await?;

	// Roles
	//*******
	sqlx::query(&format!(
		"CREATE TABLE IF NOT EXISTS {} (
		role_id integer PRIMARY KEY AUTOINCREMENT,
		user_id integer NOT NULL,
		role text NOT NULL,
		org text NOT NULL DEFAULT '',
		org_key text NOT NULL DEFAULT '',
		course_id text
	)",
		t.course_access_roles
	))
	.execute(&mut *tx)
	.await?;
	sqlx::query(&format!(
		"CREATE INDEX IF NOT EXISTS idx_course_access_roles_user ON {}(user_id)",
		t.course_access_roles
	))
	.execute(&mut *tx)
	.await?;
	sqlx::query(&format!(
		"CREATE INDEX IF NOT EXISTS idx_course_access_roles_org ON {}(org_key)",
		t.course_access_roles
	))
	.execute(&mut *tx)
	.await?;

	// Courses
	//*********
	sqlx::query(&format!(
		"CREATE TABLE IF NOT EXISTS {} (
		course_id text NOT NULL,
		org text NOT NULL,
		org_key text NOT NULL,
		display_name text,
		start_date integer,
		end_date integer,
		self_paced boolean NOT NULL DEFAULT 0,
		catalog_visibility text NOT NULL DEFAULT 'both',
		visible_to_staff_only boolean NOT NULL DEFAULT 0,
		effort text,
		PRIMARY KEY(course_id)
	)",
		t.courses
	))
	.execute(&mut *tx)
	.await?;
	sqlx::query(&format!("CREATE INDEX IF NOT EXISTS idx_courses_org ON {}(org_key)", t.courses))
		.execute(&mut *tx)
		.await?;

	sqlx::query(&format!(
		"CREATE TABLE IF NOT EXISTS {} (
		user_id integer NOT NULL,
		course_id text NOT NULL,
		is_active boolean NOT NULL DEFAULT 1,
		created integer NOT NULL DEFAULT (unixepoch()),
		PRIMARY KEY(user_id, course_id)
	)",
		t.enrollments
	))
	.execute(&mut *tx)
	.await?;
	sqlx::query(&format!("CREATE INDEX IF NOT EXISTS idx_enrollments_course ON {}(course_id)", t.enrollments))
		.execute(&mut *tx)
		.await?;

	sqlx::query(&format!(
		"CREATE TABLE IF NOT EXISTS {} (
		user_id integer NOT NULL,
		course_id text NOT NULL,
		status text NOT NULL,
		PRIMARY KEY(user_id, course_id)
	)",
		t.certificates
	))
	.execute(&mut *tx)
	.await?;
	sqlx::query(&format!("CREATE INDEX IF NOT EXISTS idx_certificates_course ON {}(course_id)", t.certificates))
		.execute(&mut *tx)
		.await?;

	sqlx::query(&format!(
		"CREATE TABLE IF NOT EXISTS {} (
		feedback_id integer PRIMARY KEY AUTOINCREMENT,
		user_id integer NOT NULL,
		course_id text NOT NULL,
		rating_content integer NOT NULL DEFAULT 0
	)",
		t.course_feedback
	))
	.execute(&mut *tx)
	.await?;
	sqlx::query(&format!(
		"CREATE INDEX IF NOT EXISTS idx_course_feedback_course ON {}(course_id)",
		t.course_feedback
	))
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

// vim: ts=4
