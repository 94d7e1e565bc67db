//! Tenant configurations and their site routes

use std::collections::BTreeMap;

use sqlx::{Row, SqlitePool};

use crate::tables::TableMap;
use crate::utils::*;
use insight_types::prelude::*;
use insight_types::tenant_adapter::{OrgFilter, TenantConfig};

/// Stored filters that are not a string or a list of strings are treated as missing
fn parse_org_filter(tn_id: TnId, raw: Option<&str>) -> Option<OrgFilter> {
	let raw = raw.filter(|s| !s.trim().is_empty())?;
	serde_json::from_str(raw)
		.inspect_err(|err| warn!(tn_id = %tn_id, "invalid course_org_filter: {}", err))
		.ok()
}

pub(crate) async fn list(db: &SqlitePool, t: &TableMap) -> ClResult<Vec<TenantConfig>> {
	let rows = sqlx::query(&format!("SELECT domain, tn_id FROM {} ORDER BY tn_id, domain", t.routes))
		.fetch_all(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	let mut routes: BTreeMap<u32, Vec<Box<str>>> = BTreeMap::new();
	for row in rows {
		let tn_id: u32 = row.try_get("tn_id").inspect_err(inspect).map_err(|_| Error::DbError)?;
		let domain: String = row.try_get("domain").inspect_err(inspect).map_err(|_| Error::DbError)?;
		routes.entry(tn_id).or_default().push(domain.into());
	}

	let rows = sqlx::query(&format!(
		"SELECT tn_id, lms_base, course_org_filter, dashboard_enabled, platform_name, logo_image_url
		FROM {} ORDER BY tn_id",
		t.tenants
	))
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	collect_res(rows.iter().map(|row| {
		let tn_id = TnId(row.try_get("tn_id")?);
		let filter: Option<&str> = row.try_get("course_org_filter")?;
		Ok(TenantConfig {
			tn_id,
			routes: routes.remove(&tn_id.0).unwrap_or_default(),
			lms_base: row.try_get::<Option<String>, _>("lms_base")?.map(Into::into),
			course_org_filter: parse_org_filter(tn_id, filter),
			dashboard_enabled: row.try_get("dashboard_enabled")?,
			platform_name: row.try_get::<Option<String>, _>("platform_name")?.map(Into::into),
			logo_image_url: row.try_get::<Option<String>, _>("logo_image_url")?.map(Into::into),
		})
	}))
}

pub(crate) async fn create(db: &SqlitePool, t: &TableMap, tenant: &TenantConfig) -> ClResult<()> {
	let filter = tenant.course_org_filter.as_ref().map(serde_json::to_string).transpose()?;
	let mut tx = db.begin().await.inspect_err(inspect).map_err(|_| Error::DbError)?;

	sqlx::query(&format!(
		"INSERT INTO {} (tn_id, lms_base, course_org_filter, dashboard_enabled, platform_name, logo_image_url)
		VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
		t.tenants
	))
	.bind(tenant.tn_id.0)
	.bind(tenant.lms_base.as_deref())
	.bind(filter)
	.bind(tenant.dashboard_enabled)
	.bind(tenant.platform_name.as_deref())
	.bind(tenant.logo_image_url.as_deref())
	.execute(&mut *tx)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	for domain in &tenant.routes {
		sqlx::query(&format!("INSERT INTO {} (domain, tn_id) VALUES (?1, ?2)", t.routes))
			.bind(&**domain)
			.bind(tenant.tn_id.0)
			.execute(&mut *tx)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;
	}

	tx.commit().await.inspect_err(inspect).map_err(|_| Error::DbError)?;
	Ok(())
}

/// Stores a raw `course_org_filter` value as-is
pub(crate) async fn set_raw_org_filter(
	db: &SqlitePool,
	t: &TableMap,
	tn_id: TnId,
	raw: Option<&str>,
) -> ClResult<()> {
	let res = sqlx::query(&format!("UPDATE {} SET course_org_filter = ?2 WHERE tn_id = ?1", t.tenants))
		.bind(tn_id.0)
		.bind(raw)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}


// vim: ts=4
