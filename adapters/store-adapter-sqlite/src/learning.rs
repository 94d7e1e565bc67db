//! Courses, enrollments and certificates
//!
//! Every read pushes the [`CourseQuery`] down as a WHERE clause on the course
//! table (aliased `c`), so only in-scope rows leave the database.

use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, sqlite::SqliteRow};

use crate::tables::TableMap;
use crate::user::flags_from_row;
use crate::utils::*;
use insight_types::course_query::{Annotation, CourseQuery, CourseScope};
use insight_types::learning_adapter::{
	CERTIFICATE_DOWNLOADABLE, CertificateRow, Course, EnrollmentRow, RatingRow,
};
use insight_types::prelude::*;

const VISIBLE: &str = "(c.catalog_visibility IN ('about', 'both') AND c.visible_to_staff_only = 0)";

fn push_course_filter(query: &mut QueryBuilder<'_, Sqlite>, q: &CourseQuery) {
	query.push(" WHERE c.org_key IN ");
	push_in(query, q.orgs());

	if let CourseScope::Restricted { full_orgs, courses } = q.scope() {
		query.push(" AND (0");
		if !full_orgs.is_empty() {
			query.push(" OR c.org_key IN ");
			push_in(query, full_orgs);
		}
		if !courses.is_empty() {
			query.push(" OR c.course_id IN ");
			push_in(query, courses);
		}
		query.push(")");
	}

	match q.visible_filter() {
		Some(true) => {
			query.push(" AND ").push(VISIBLE);
		}
		Some(false) => {
			query.push(" AND NOT ").push(VISIBLE);
		}
		None => {}
	}

	if let Some(active) = q.active_filter() {
		let now = q.now().0;
		query.push(if active { " AND " } else { " AND NOT " });
		query.push("((c.start_date IS NULL OR c.start_date <= ").push_bind(now);
		query.push(") AND (c.end_date IS NULL OR c.end_date >= ").push_bind(now);
		query.push("))");
	}
}

fn course_from_row(row: &SqliteRow, q: &CourseQuery) -> Result<Course, sqlx::Error> {
	let count = |col: &str, annotation: Annotation| -> Result<Option<u64>, sqlx::Error> {
		if q.has_annotation(annotation) {
			let n: i64 = row.try_get(col)?;
			Ok(Some(u64::try_from(n).unwrap_or_default()))
		} else {
			Ok(None)
		}
	};
	Ok(Course {
		course_id: row.try_get::<String, _>("course_id")?.into(),
		org: row.try_get::<String, _>("org")?.into(),
		display_name: row.try_get::<Option<String>, _>("display_name")?.map(Into::into),
		start: row.try_get::<Option<i64>, _>("start_date")?.map(Timestamp),
		end: row.try_get::<Option<i64>, _>("end_date")?.map(Timestamp),
		self_paced: row.try_get("self_paced")?,
		catalog_visibility: row.try_get::<String, _>("catalog_visibility")?.into(),
		visible_to_staff_only: row.try_get("visible_to_staff_only")?,
		effort: row.try_get::<Option<String>, _>("effort")?.map(Into::into),
		certificates_count: count("certificates_count", Annotation::CertificatesCount)?,
		enrollments_count: count("enrollments_count", Annotation::EnrollmentsCount)?,
	})
}

pub(crate) async fn list_courses(db: &SqlitePool, t: &TableMap, q: &CourseQuery) -> ClResult<Vec<Course>> {
	if q.is_empty() {
		return Ok(Vec::new());
	}

	let mut query = QueryBuilder::new(
		"SELECT c.course_id, c.org, c.display_name, c.start_date, c.end_date, c.self_paced,
		c.catalog_visibility, c.visible_to_staff_only, c.effort",
	);
	if q.has_annotation(Annotation::CertificatesCount) {
		query.push(format!(
			", (SELECT count(*) FROM {} g JOIN {} u ON u.user_id = g.user_id
			WHERE g.course_id = c.course_id AND u.is_active = 1 AND g.status = ",
			t.certificates, t.users
		));
		query.push_bind(CERTIFICATE_DOWNLOADABLE).push(") AS certificates_count");
	}
	if q.has_annotation(Annotation::EnrollmentsCount) {
		query.push(format!(
			", (SELECT count(*) FROM {} e JOIN {} u ON u.user_id = e.user_id
			WHERE e.course_id = c.course_id AND u.is_active = 1 AND e.is_active = 1) AS enrollments_count",
			t.enrollments, t.users
		));
	}
	query.push(format!(" FROM {} c", t.courses));
	push_course_filter(&mut query, q);
	query.push(" ORDER BY c.course_id");

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).map_err(|_| Error::DbError)?;
	collect_res(rows.iter().map(|row| course_from_row(row, q)))
}

pub(crate) async fn list_enrollments(
	db: &SqlitePool,
	t: &TableMap,
	q: &CourseQuery,
) -> ClResult<Vec<EnrollmentRow>> {
	if q.is_empty() {
		return Ok(Vec::new());
	}

	let mut query = QueryBuilder::new(format!(
		"SELECT e.user_id, e.course_id, c.org, e.is_active AS enrollment_active, e.created,
		u.is_active, u.is_staff, u.is_superuser
		FROM {} e JOIN {} c ON c.course_id = e.course_id JOIN {} u ON u.user_id = e.user_id",
		t.enrollments, t.courses, t.users
	));
	push_course_filter(&mut query, q);
	query.push(" ORDER BY e.user_id, e.course_id");

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).map_err(|_| Error::DbError)?;
	collect_res(rows.iter().map(|row| {
		Ok(EnrollmentRow {
			user_id: UserId(row.try_get("user_id")?),
			course_id: row.try_get::<String, _>("course_id")?.into(),
			org: row.try_get::<String, _>("org")?.into(),
			is_active: row.try_get("enrollment_active")?,
			user: flags_from_row(row)?,
			created: Timestamp(row.try_get("created")?),
		})
	}))
}

pub(crate) async fn list_certificates(
	db: &SqlitePool,
	t: &TableMap,
	q: &CourseQuery,
	status: &str,
) -> ClResult<Vec<CertificateRow>> {
	if q.is_empty() {
		return Ok(Vec::new());
	}

	let mut query = QueryBuilder::new(format!(
		"SELECT g.user_id, g.course_id, c.org, g.status, u.is_active, u.is_staff, u.is_superuser
		FROM {} g JOIN {} c ON c.course_id = g.course_id JOIN {} u ON u.user_id = g.user_id",
		t.certificates, t.courses, t.users
	));
	push_course_filter(&mut query, q);
	query.push(" AND g.status = ").push_bind(status.to_owned());
	query.push(" ORDER BY g.user_id, g.course_id");

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).map_err(|_| Error::DbError)?;
	collect_res(rows.iter().map(|row| {
		Ok(CertificateRow {
			user_id: UserId(row.try_get("user_id")?),
			course_id: row.try_get::<String, _>("course_id")?.into(),
			org: row.try_get::<String, _>("org")?.into(),
			status: row.try_get::<String, _>("status")?.into(),
			user: flags_from_row(row)?,
		})
	}))
}

pub(crate) async fn list_course_ratings(
	db: &SqlitePool,
	t: &TableMap,
	q: &CourseQuery,
) -> ClResult<Vec<RatingRow>> {
	if q.is_empty() {
		return Ok(Vec::new());
	}

	let mut query = QueryBuilder::new(format!(
		"SELECT f.course_id, c.org, f.rating_content, count(*) AS feedback_count
		FROM {} f JOIN {} c ON c.course_id = f.course_id",
		t.course_feedback, t.courses
	));
	push_course_filter(&mut query, q);
	query.push(" AND f.rating_content > 0");
	query.push(" GROUP BY f.course_id, c.org, f.rating_content ORDER BY f.course_id, f.rating_content");

	let rows = query.build().fetch_all(db).await.inspect_err(inspect).map_err(|_| Error::DbError)?;
	collect_res(rows.iter().map(|row| {
		Ok(RatingRow {
			course_id: row.try_get::<String, _>("course_id")?.into(),
			org: row.try_get::<String, _>("org")?.into(),
			rating: u32::try_from(row.try_get::<i64, _>("rating_content")?).unwrap_or_default(),
			count: u64::try_from(row.try_get::<i64, _>("feedback_count")?).unwrap_or_default(),
		})
	}))
}

pub(crate) async fn create_course(db: &SqlitePool, t: &TableMap, course: &Course) -> ClResult<()> {
	sqlx::query(&format!(
		"INSERT INTO {} (course_id, org, org_key, display_name, start_date, end_date, self_paced,
		catalog_visibility, visible_to_staff_only, effort) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
		t.courses
	))
	.bind(&*course.course_id)
	.bind(&*course.org)
	.bind(OrgName::key(&course.org))
	.bind(course.display_name.as_deref())
	.bind(course.start.map(|ts| ts.0))
	.bind(course.end.map(|ts| ts.0))
	.bind(course.self_paced)
	.bind(&*course.catalog_visibility)
	.bind(course.visible_to_staff_only)
	.bind(course.effort.as_deref())
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;
	Ok(())
}

pub(crate) async fn create_enrollment(
	db: &SqlitePool,
	t: &TableMap,
	user_id: UserId,
	course_id: &str,
	is_active: bool,
) -> ClResult<()> {
	sqlx::query(&format!(
		"INSERT INTO {} (user_id, course_id, is_active) VALUES (?1, ?2, ?3)
		ON CONFLICT (user_id, course_id) DO UPDATE SET is_active = excluded.is_active",
		t.enrollments
	))
	.bind(user_id.0)
	.bind(course_id)
	.bind(is_active)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;
	Ok(())
}

pub(crate) async fn create_certificate(
	db: &SqlitePool,
	t: &TableMap,
	user_id: UserId,
	course_id: &str,
	status: &str,
) -> ClResult<()> {
	sqlx::query(&format!(
		"INSERT INTO {} (user_id, course_id, status) VALUES (?1, ?2, ?3)
		ON CONFLICT (user_id, course_id) DO UPDATE SET status = excluded.status",
		t.certificates
	))
	.bind(user_id.0)
	.bind(course_id)
	.bind(status)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;
	Ok(())
}

pub(crate) async fn create_course_feedback(
	db: &SqlitePool,
	t: &TableMap,
	user_id: UserId,
	course_id: &str,
	rating: u32,
) -> ClResult<()> {
	sqlx::query(&format!("INSERT INTO {} (user_id, course_id, rating_content) VALUES (?1, ?2, ?3)", t.course_feedback))
		.bind(user_id.0)
		.bind(course_id)
		.bind(i64::from(rating))
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	Ok(())
}

// vim: ts=4
