//! Error type shared by every Insight crate.

use axum::{Json, http::StatusCode, response::IntoResponse};

use crate::prelude::*;

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,
	DbError,
	Parse,

	/// Required configuration is missing or malformed
	ConfigError(String),
	/// An external backend could not be reached
	ConnectionError(String),
	/// Rejected request input. `details` names the offending values.
	InvalidInput {
		reason: String,
		details: serde_json::Value,
	},
	ValidationError(String),
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl Error {
	pub fn invalid_input(reason: impl Into<String>, details: serde_json::Value) -> Self {
		Error::InvalidInput { reason: reason.into(), details }
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		warn!("serde_json error: {}", err);
		Self::Parse
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::DbError => write!(f, "database error"),
			Error::Parse => write!(f, "parse error"),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::ConnectionError(msg) => write!(f, "connection error: {}", msg),
			Error::InvalidInput { reason, details } => write!(f, "{}: {}", reason, details),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		match self {
			Error::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
			Error::PermissionDenied => (
				StatusCode::FORBIDDEN,
				Json(serde_json::json!({ "reason": "permission denied", "details": {} })),
			)
				.into_response(),
			Error::InvalidInput { reason, details } => (
				StatusCode::BAD_REQUEST,
				Json(serde_json::json!({ "reason": reason, "details": details })),
			)
				.into_response(),
			Error::ValidationError(msg) => (
				StatusCode::BAD_REQUEST,
				Json(serde_json::json!({ "reason": msg, "details": {} })),
			)
				.into_response(),
			Error::ConnectionError(msg) => {
				error!("backend unreachable: {}", msg);
				StatusCode::SERVICE_UNAVAILABLE.into_response()
			}
			err => {
				error!("request failed: {}", err);
				StatusCode::INTERNAL_SERVER_ERROR.into_response()
			}
		}
	}
}

// vim: ts=4
