//! Common types used throughout the engine.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

// TnId //
//******//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TnId(pub u32);

impl std::fmt::Display for TnId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

// UserId //
//********//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

// OrgName //
//*********//
/// Organization short name in canonical (trimmed, lowercase) form.
///
/// The same organization may be registered as `ORG1` by one tenant and `org1`
/// by another; both map to the same `OrgName`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgName(Box<str>);

impl OrgName {
	/// Returns `None` for names that are empty after trimming.
	pub fn new(raw: &str) -> Option<Self> {
		let canonical = OrgName::key(raw);
		if canonical.is_empty() { None } else { Some(OrgName(canonical.into())) }
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Canonical key of a raw org label, empty for blank labels
	pub fn key(raw: &str) -> String {
		raw.trim().to_lowercase()
	}

	pub fn matches(&self, raw: &str) -> bool {
		OrgName::key(raw) == *self.0
	}
}

impl std::fmt::Display for OrgName {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for OrgName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

// Timestamp //
//***********//
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		let res = SystemTime::now()
			.duration_since(SystemTime::UNIX_EPOCH)
			.map(|d| d.as_secs())
			.unwrap_or_default();
		Timestamp(i64::try_from(res).unwrap_or(i64::MAX))
	}

	pub fn from_now(delta: i64) -> Timestamp {
		Timestamp::now().add_seconds(delta)
	}

	pub fn add_seconds(&self, seconds: i64) -> Timestamp {
		Timestamp(self.0.saturating_add(seconds))
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}


// vim: ts=4
