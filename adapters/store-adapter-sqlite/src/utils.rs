//! Shared helpers for the SQLite store adapter

use insight_types::prelude::*;
use sqlx::sqlite::SqliteRow;

/// Log database error for debugging
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Map a single-row query result, translating SQL errors to ClResult
pub(crate) fn map_res<T, F>(row: Result<SqliteRow, sqlx::Error>, f: F) -> ClResult<T>
where
	F: FnOnce(SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(row) => f(row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(sqlx::Error::RowNotFound) => Err(Error::NotFound),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

/// Collect an iterator of row conversions, translating errors
pub(crate) fn collect_res<T>(
	iter: impl Iterator<Item = Result<T, sqlx::Error>>,
) -> ClResult<Vec<T>> {
	let mut items = Vec::new();
	for item in iter {
		items.push(item.inspect_err(inspect).map_err(|_| Error::DbError)?);
	}
	Ok(items)
}

/// Build an IN clause with parameterized values
pub(crate) fn push_in<S: AsRef<str>>(
	query: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>,
	values: impl IntoIterator<Item = S>,
) {
	query.push("(");
	for (i, value) in values.into_iter().enumerate() {
		if i > 0 {
			query.push(", ");
		}
		query.push_bind(value.as_ref().to_owned());
	}
	query.push(")");
}

/// Build an IN clause of integer IDs
pub(crate) fn push_in_ids(query: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>, values: &[UserId]) {
	query.push("(");
	for (i, value) in values.iter().enumerate() {
		if i > 0 {
			query.push(", ");
		}
		query.push_bind(value.0);
	}
	query.push(")");
}

/// Escape `%`, `_` and `\` for a LIKE pattern using `ESCAPE '\'`
pub(crate) fn like_pattern(search: &str) -> String {
	let mut res = String::with_capacity(search.len() + 2);
	res.push('%');
	for c in search.chars() {
		if matches!(c, '%' | '_' | '\\') {
			res.push('\\');
		}
		res.push(c);
	}
	res.push('%');
	res
}


// vim: ts=4
