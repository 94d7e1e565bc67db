//! Process-wide result cache
//!
//! Entries are JSON values with an expiry time, held in an LRU so memory stays
//! bounded. Statistics expire by TTL; role caches are deleted explicitly by the
//! write path. Concurrent population of the same key is last-writer-wins.

use lru::LruCache;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::prelude::*;

pub const KEY_TENANTS_INFO: &str = "insight_tenants_info";
pub const KEY_PREFIX_COURSE_ACCESS_ROLES: &str = "insight_user_course_access_roles_";
pub const KEY_PREFIX_LIVE_STATISTICS: &str = "insight_live_statistics_per_tenant_";
pub const KEY_PREFIX_STATISTICS: &str = "insight_statistics_";
pub const KEY_PREFIX_COURSES_RATINGS: &str = "insight_courses_ratings_";

/// Named caches that can be invalidated as a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheName {
	TenantsInfo,
	CourseAccessRoles,
	LiveStatistics,
	Statistics,
	CoursesRatings,
}

impl CacheName {
	pub const ALL: [CacheName; 5] = [
		CacheName::TenantsInfo,
		CacheName::CourseAccessRoles,
		CacheName::LiveStatistics,
		CacheName::Statistics,
		CacheName::CoursesRatings,
	];

	pub fn key_prefix(self) -> &'static str {
		match self {
			CacheName::TenantsInfo => KEY_TENANTS_INFO,
			CacheName::CourseAccessRoles => KEY_PREFIX_COURSE_ACCESS_ROLES,
			CacheName::LiveStatistics => KEY_PREFIX_LIVE_STATISTICS,
			CacheName::Statistics => KEY_PREFIX_STATISTICS,
			CacheName::CoursesRatings => KEY_PREFIX_COURSES_RATINGS,
		}
	}
}

/// `Skip` computes without reading or storing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
	#[default]
	Use,
	Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
	pub created: Timestamp,
	pub expiry: Timestamp,
	pub data: serde_json::Value,
}

impl CacheEntry {
	pub fn is_expired(&self) -> bool {
		Timestamp::now() >= self.expiry
	}
}

pub struct Cache {
	entries: Arc<parking_lot::RwLock<LruCache<String, CacheEntry>>>,
}

impl std::fmt::Debug for Cache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Cache").field("len", &self.len()).finish()
	}
}

impl Cache {
	pub fn new(max_entries: usize) -> Self {
		let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);

		Self { entries: Arc::new(parking_lot::RwLock::new(LruCache::new(capacity))) }
	}

	/// Live entry for `key`. Expired entries are removed on access.
	pub fn get(&self, key: &str) -> Option<CacheEntry> {
		let mut entries = self.entries.write();

		match entries.get(key) {
			Some(entry) if entry.is_expired() => {
				entries.pop(key);
				None
			}
			Some(entry) => Some(entry.clone()),
			None => None,
		}
	}

	pub fn set(&self, key: &str, data: serde_json::Value, timeout: i64) -> ClResult<()> {
		if timeout <= 0 {
			return Err(Error::ValidationError(format!(
				"cache timeout must be greater than 0 (key {})",
				key
			)));
		}
		let created = Timestamp::now();
		let entry = CacheEntry { created, expiry: created.add_seconds(timeout), data };
		self.entries.write().put(key.to_string(), entry);
		Ok(())
	}

	pub fn delete(&self, key: &str) -> bool {
		self.entries.write().pop(key).is_some()
	}

	/// Deletes every entry whose key starts with `prefix`
	pub fn delete_prefix(&self, prefix: &str) -> usize {
		let mut entries = self.entries.write();
		let keys: Vec<String> =
			entries.iter().filter(|(k, _)| k.starts_with(prefix)).map(|(k, _)| k.clone()).collect();
		for key in &keys {
			entries.pop(key);
		}
		keys.len()
	}

	/// Clears one named cache, or all of them
	pub fn invalidate(&self, name: Option<CacheName>) -> usize {
		let names = match name {
			Some(name) => vec![name],
			None => CacheName::ALL.to_vec(),
		};
		let removed = names.into_iter().map(|name| self.delete_prefix(name.key_prefix())).sum();
		debug!(?name, removed, "cache invalidated");
		removed
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Returns the cached value for `key`, or computes, stores and returns it.
	///
	/// Empty results (null, `{}`, `[]`) are returned but not stored. A stored
	/// value that no longer deserializes into `T` is treated as a miss.
	pub async fn cached<T, F, Fut>(
		&self,
		key: &str,
		timeout: i64,
		mode: CacheMode,
		compute: F,
	) -> ClResult<T>
	where
		T: Serialize + DeserializeOwned,
		F: FnOnce() -> Fut,
		Fut: Future<Output = ClResult<T>>,
	{
		if timeout <= 0 {
			return Err(Error::ValidationError(format!(
				"cache timeout must be greater than 0 (key {})",
				key
			)));
		}
		if mode == CacheMode::Skip {
			return compute().await;
		}

		if let Some(entry) = self.get(key) {
			match serde_json::from_value::<T>(entry.data) {
				Ok(value) => return Ok(value),
				Err(err) => warn!(key, "cached value does not match its type: {}", err),
			}
		}

		debug!(key, "cache miss");
		let value = compute().await?;
		let data = serde_json::to_value(&value)?;
		if !is_empty_value(&data) {
			self.set(key, data, timeout)?;
		}
		Ok(value)
	}
}

fn is_empty_value(value: &serde_json::Value) -> bool {
	match value {
		serde_json::Value::Null => true,
		serde_json::Value::Object(map) => map.is_empty(),
		serde_json::Value::Array(items) => items.is_empty(),
		_ => false,
	}
}


// vim: ts=4
