//! Course access roles

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::tables::TableMap;
use crate::utils::*;
use insight_types::prelude::*;
use insight_types::role_adapter::{CreateRoleAssignment, RoleAssignment};

fn role_from_row(row: &SqliteRow) -> Result<RoleAssignment, sqlx::Error> {
	Ok(RoleAssignment {
		role_id: row.try_get("role_id")?,
		user_id: UserId(row.try_get("user_id")?),
		role: row.try_get::<String, _>("role")?.into(),
		org: row.try_get::<String, _>("org")?.into(),
		course_id: row.try_get::<Option<String>, _>("course_id")?.map(Into::into),
		course_org: row.try_get::<Option<String>, _>("course_org")?.map(Into::into),
	})
}

fn select_roles(t: &TableMap) -> String {
	format!(
		"SELECT r.role_id, r.user_id, r.role, r.org, r.course_id, c.org AS course_org
		FROM {} r LEFT JOIN {} c ON c.course_id = r.course_id",
		t.course_access_roles, t.courses
	)
}

pub(crate) async fn list_user_roles(db: &SqlitePool, t: &TableMap, user_id: UserId) -> ClResult<Vec<RoleAssignment>> {
	let rows = sqlx::query(&format!(
		"{} WHERE r.user_id = ?1 ORDER BY r.role, r.org_key, r.course_id",
		select_roles(t)
	))
	.bind(user_id.0)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;
	collect_res(rows.iter().map(role_from_row))
}

pub(crate) async fn list_role_holders(
	db: &SqlitePool,
	t: &TableMap,
	orgs: &[OrgName],
) -> ClResult<Vec<RoleAssignment>> {
	let mut query = sqlx::QueryBuilder::new(select_roles(t));
	query.push(" WHERE trim(r.org) = ''");
	if !orgs.is_empty() {
		query.push(" OR r.org_key IN ");
		push_in(&mut query, orgs);
	}
	query.push(" ORDER BY r.user_id, r.role_id");
	let rows = query.build().fetch_all(db).await.inspect_err(inspect).map_err(|_| Error::DbError)?;
	collect_res(rows.iter().map(role_from_row))
}

async fn read(db: &SqlitePool, t: &TableMap, role_id: i64) -> ClResult<RoleAssignment> {
	let res = sqlx::query(&format!("{} WHERE r.role_id = ?1", select_roles(t)))
		.bind(role_id)
		.fetch_one(db)
		.await;
	map_res(res, |row| role_from_row(&row))
}

pub(crate) async fn create(db: &SqlitePool, t: &TableMap, role: &CreateRoleAssignment) -> ClResult<RoleAssignment> {
	let course_id = role.course_id.as_deref().map(str::trim).filter(|c| !c.is_empty());
	let role_id: i64 = sqlx::query_scalar(&format!(
		"INSERT INTO {} (user_id, role, org, org_key, course_id) VALUES (?1, ?2, ?3, ?4, ?5) RETURNING role_id",
		t.course_access_roles
	))
	.bind(role.user_id.0)
	.bind(role.role.trim())
	.bind(role.org.trim())
	.bind(OrgName::key(&role.org))
	.bind(course_id)
	.fetch_one(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;
	debug!(role_id, user_id = %role.user_id, role = %role.role, "role created");

	read(db, t, role_id).await
}

pub(crate) async fn delete(db: &SqlitePool, t: &TableMap, role_id: i64) -> ClResult<RoleAssignment> {
	let role = read(db, t, role_id).await?;
	let res = sqlx::query(&format!("DELETE FROM {} WHERE role_id = ?1", t.course_access_roles))
		.bind(role_id)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	debug!(role_id, user_id = %role.user_id, "role deleted");
	Ok(role)
}

// vim: ts=4
