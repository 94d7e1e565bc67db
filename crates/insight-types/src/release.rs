//! Release line of the hosting learning platform.
//!
//! Resolved once at startup. Adapters pick their storage mapping from it, so
//! aggregation code never needs to know which release it runs against.

use serde::{Deserialize, Serialize};

use crate::prelude::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformRelease {
	Redwood,
	#[default]
	Sumac,
	Teak,
}

impl PlatformRelease {
	pub fn as_str(&self) -> &'static str {
		match self {
			PlatformRelease::Redwood => "redwood",
			PlatformRelease::Sumac => "sumac",
			PlatformRelease::Teak => "teak",
		}
	}

	/// Resolves a release line name. Unsupported lines fall back to the oldest
	/// supported release when they sort before it, otherwise to `Sumac`.
	pub fn resolve(release_line: &str) -> PlatformRelease {
		let line = release_line.trim().to_lowercase();
		match line.as_str() {
			"redwood" => PlatformRelease::Redwood,
			"sumac" => PlatformRelease::Sumac,
			"teak" => PlatformRelease::Teak,
			_ => {
				let fallback = if line.as_str() < "redwood" && line != "master" {
					PlatformRelease::Redwood
				} else {
					PlatformRelease::Sumac
				};
				error!(
					"platform release line ({}) is not supported, defaulting to ({})",
					release_line,
					fallback.as_str()
				);
				fallback
			}
		}
	}
}


// vim: ts=4
