//! User directory and signup sources

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::tables::TableMap;
use crate::utils::*;
use insight_types::prelude::*;
use insight_types::user_adapter::{ListUserOptions, User, UserFlags};

const USER_COLUMNS: &str = "u.user_id, u.username, u.email, u.name, u.is_active, u.is_staff, u.is_superuser";

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
	Ok(User {
		user_id: UserId(row.try_get("user_id")?),
		username: row.try_get::<String, _>("username")?.into(),
		email: row.try_get::<String, _>("email")?.into(),
		name: row.try_get::<Option<String>, _>("name")?.map(Into::into),
		is_active: row.try_get("is_active")?,
		is_staff: row.try_get("is_staff")?,
		is_superuser: row.try_get("is_superuser")?,
	})
}

pub(crate) fn flags_from_row(row: &SqliteRow) -> Result<UserFlags, sqlx::Error> {
	Ok(UserFlags {
		is_active: row.try_get("is_active")?,
		is_staff: row.try_get("is_staff")?,
		is_superuser: row.try_get("is_superuser")?,
	})
}

pub(crate) async fn read(db: &SqlitePool, t: &TableMap, user_id: UserId) -> ClResult<User> {
	let res = sqlx::query(&format!("SELECT {} FROM {} u WHERE u.user_id = ?1", USER_COLUMNS, t.users))
		.bind(user_id.0)
		.fetch_one(db)
		.await;
	map_res(res, |row| user_from_row(&row))
}

pub(crate) async fn find_by_key(db: &SqlitePool, t: &TableMap, key: &str) -> ClResult<Vec<User>> {
	let rows = sqlx::query(&format!(
		"SELECT {} FROM {} u WHERE u.username = ?1 OR lower(u.email) = lower(?1) ORDER BY u.user_id",
		USER_COLUMNS, t.users
	))
	.bind(key.trim())
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;
	collect_res(rows.iter().map(user_from_row))
}

fn push_user_filter(query: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>, user_ids: &[UserId], search: Option<&str>) {
	query.push(" WHERE u.user_id IN ");
	push_in_ids(query, user_ids);
	if let Some(search) = search {
		let pattern = like_pattern(search);
		query.push(" AND (u.username LIKE ").push_bind(pattern.clone());
		query.push(" ESCAPE '\\' OR u.email LIKE ").push_bind(pattern.clone());
		query.push(" ESCAPE '\\' OR u.name LIKE ").push_bind(pattern);
		query.push(" ESCAPE '\\')");
	}
}

pub(crate) async fn list(
	db: &SqlitePool,
	t: &TableMap,
	user_ids: &[UserId],
	opts: &ListUserOptions<'_>,
) -> ClResult<(Vec<User>, u64)> {
	if user_ids.is_empty() {
		return Ok((Vec::new(), 0));
	}

	let mut query = sqlx::QueryBuilder::new(format!("SELECT count(*) FROM {} u", t.users));
	push_user_filter(&mut query, user_ids, opts.search);
	let count: i64 = query
		.build_query_scalar::<i64>()
		.fetch_one(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	let mut query = sqlx::QueryBuilder::new(format!("SELECT {} FROM {} u", USER_COLUMNS, t.users));
	push_user_filter(&mut query, user_ids, opts.search);
	query.push(" ORDER BY u.user_id LIMIT ").push_bind(i64::from(opts.limit));
	query.push(" OFFSET ").push_bind(i64::from(opts.offset));
	let rows = query.build().fetch_all(db).await.inspect_err(inspect).map_err(|_| Error::DbError)?;

	let users = collect_res(rows.iter().map(user_from_row))?;
	Ok((users, u64::try_from(count).unwrap_or_default()))
}

pub(crate) async fn list_site_signups(
	db: &SqlitePool,
	t: &TableMap,
	site: &str,
) -> ClResult<Vec<(UserId, UserFlags)>> {
	let rows = sqlx::query(&format!(
		"SELECT u.user_id, u.is_active, u.is_staff, u.is_superuser
		FROM {} s JOIN {} u ON u.user_id = s.user_id
		WHERE s.site = ?1 ORDER BY u.user_id",
		t.signup_sources, t.users
	))
	.bind(site)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;
	collect_res(rows.iter().map(|row| Ok((UserId(row.try_get("user_id")?), flags_from_row(row)?))))
}

pub(crate) async fn add_signup_sources(
	db: &SqlitePool,
	t: &TableMap,
	user_id: UserId,
	sites: &[Box<str>],
) -> ClResult<u32> {
	let mut tx = db.begin().await.inspect_err(inspect).map_err(|_| Error::DbError)?;
	let mut created = 0;
	for site in sites {
		let res = sqlx::query(&format!("INSERT OR IGNORE INTO {} (user_id, site) VALUES (?1, ?2)", t.signup_sources))
			.bind(user_id.0)
			.bind(&**site)
			.execute(&mut *tx)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;
		created += u32::try_from(res.rows_affected()).unwrap_or_default();
	}
	tx.commit().await.inspect_err(inspect).map_err(|_| Error::DbError)?;
	Ok(created)
}

pub(crate) async fn create(db: &SqlitePool, t: &TableMap, user: &User) -> ClResult<()> {
	sqlx::query(&format!(
		"INSERT INTO {} (user_id, username, email, name, is_active, is_staff, is_superuser)
		VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
		t.users
	))
	.bind(user.user_id.0)
	.bind(&*user.username)
	.bind(&*user.email)
	.bind(user.name.as_deref())
	.bind(user.is_active)
	.bind(user.is_staff)
	.bind(user.is_superuser)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;
	Ok(())
}

// vim: ts=4
