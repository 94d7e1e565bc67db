//! Engine settings
//!
//! Every value has a default. `from_env` overrides them from `INSIGHT_*`
//! environment variables.

use serde::Deserialize;
use std::env;

use crate::prelude::*;
use insight_types::release::PlatformRelease;

pub const DEFAULT_TIMEOUT_TENANTS_INFO: i64 = 2 * 60 * 60;
pub const DEFAULT_TIMEOUT_COURSE_ACCESS_ROLES: i64 = 30 * 60;
pub const DEFAULT_TIMEOUT_LIVE_STATISTICS: i64 = 2 * 60 * 60;
pub const DEFAULT_TIMEOUT_STATISTICS: i64 = 15 * 60;
pub const DEFAULT_TIMEOUT_COURSES_RATINGS: i64 = 60 * 60;
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;
/// Hours
pub const DEFAULT_COURSE_EFFORT: f64 = 12.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InsightSettings {
	pub cache_timeout_tenants_info: i64,
	pub cache_timeout_course_access_roles: i64,
	pub cache_timeout_live_statistics: i64,
	pub cache_timeout_statistics: i64,
	pub cache_timeout_courses_ratings: i64,
	pub cache_capacity: usize,
	pub default_course_effort: f64,
	/// Org-wide roles granting elevated tenant access
	pub elevated_roles: Vec<Box<str>>,
	pub platform_release: PlatformRelease,
	pub db_path: Box<str>,
	pub listen: Box<str>,
}

impl Default for InsightSettings {
	fn default() -> Self {
		InsightSettings {
			cache_timeout_tenants_info: DEFAULT_TIMEOUT_TENANTS_INFO,
			cache_timeout_course_access_roles: DEFAULT_TIMEOUT_COURSE_ACCESS_ROLES,
			cache_timeout_live_statistics: DEFAULT_TIMEOUT_LIVE_STATISTICS,
			cache_timeout_statistics: DEFAULT_TIMEOUT_STATISTICS,
			cache_timeout_courses_ratings: DEFAULT_TIMEOUT_COURSES_RATINGS,
			cache_capacity: DEFAULT_CACHE_CAPACITY,
			default_course_effort: DEFAULT_COURSE_EFFORT,
			elevated_roles: vec!["staff".into(), "org_course_creator_group".into()],
			platform_release: PlatformRelease::default(),
			db_path: "./data/insight.db".into(),
			listen: "127.0.0.1:8080".into(),
		}
	}
}

impl InsightSettings {
	pub fn from_env() -> ClResult<Self> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Builds settings from an arbitrary variable source
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClResult<Self> {
		let mut settings = InsightSettings::default();

		if let Some(val) = lookup("INSIGHT_CACHE_TIMEOUT_TENANTS_INFO") {
			settings.cache_timeout_tenants_info = parse_timeout("INSIGHT_CACHE_TIMEOUT_TENANTS_INFO", &val)?;
		}
		if let Some(val) = lookup("INSIGHT_CACHE_TIMEOUT_COURSE_ACCESS_ROLES") {
			settings.cache_timeout_course_access_roles =
				parse_timeout("INSIGHT_CACHE_TIMEOUT_COURSE_ACCESS_ROLES", &val)?;
		}
		if let Some(val) = lookup("INSIGHT_CACHE_TIMEOUT_LIVE_STATISTICS") {
			settings.cache_timeout_live_statistics =
				parse_timeout("INSIGHT_CACHE_TIMEOUT_LIVE_STATISTICS", &val)?;
		}
		if let Some(val) = lookup("INSIGHT_CACHE_TIMEOUT_STATISTICS") {
			settings.cache_timeout_statistics = parse_timeout("INSIGHT_CACHE_TIMEOUT_STATISTICS", &val)?;
		}
		if let Some(val) = lookup("INSIGHT_CACHE_TIMEOUT_COURSES_RATINGS") {
			settings.cache_timeout_courses_ratings =
				parse_timeout("INSIGHT_CACHE_TIMEOUT_COURSES_RATINGS", &val)?;
		}
		if let Some(val) = lookup("INSIGHT_CACHE_CAPACITY") {
			settings.cache_capacity = val.trim().parse().map_err(|_| {
				Error::ConfigError(format!("INSIGHT_CACHE_CAPACITY must be a positive integer: {}", val))
			})?;
		}
		if let Some(val) = lookup("INSIGHT_DEFAULT_COURSE_EFFORT") {
			settings.default_course_effort = val
				.trim()
				.parse::<f64>()
				.ok()
				.filter(|effort| *effort > 0.0)
				.ok_or_else(|| {
					Error::ConfigError(format!("INSIGHT_DEFAULT_COURSE_EFFORT must be a positive number: {}", val))
				})?;
		}
		if let Some(val) = lookup("INSIGHT_ELEVATED_ROLES") {
			settings.elevated_roles =
				insight_types::utils::split_comma_list(&val).into_iter().map(Into::into).collect();
		}
		if let Some(val) = lookup("INSIGHT_PLATFORM_RELEASE") {
			settings.platform_release = PlatformRelease::resolve(&val);
		}
		if let Some(val) = lookup("INSIGHT_DB_PATH") {
			settings.db_path = val.into();
		}
		if let Some(val) = lookup("INSIGHT_LISTEN") {
			settings.listen = val.into();
		}

		Ok(settings)
	}

	pub fn is_elevated_role(&self, role: &str) -> bool {
		self.elevated_roles.iter().any(|r| &**r == role)
	}
}

fn parse_timeout(name: &str, val: &str) -> ClResult<i64> {
	match val.trim().parse::<i64>() {
		Ok(secs) if secs > 0 => Ok(secs),
		_ => Err(Error::ConfigError(format!("{} must be a positive number of seconds: {}", name, val))),
	}
}


// vim: ts=4
