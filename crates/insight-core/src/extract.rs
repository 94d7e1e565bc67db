//! Request extractors
//!
//! Authentication happens upstream. The authenticating layer inserts an
//! [`Auth`] value into the request extensions; handlers extract it from there.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::prelude::*;
use insight_types::user_adapter::User;

// Auth //
//******//
#[derive(Debug, Clone)]
pub struct Auth(pub User);

impl<S> FromRequestParts<S> for Auth
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		match parts.extensions.get::<Auth>() {
			Some(auth) if auth.0.is_active => Ok(auth.clone()),
			Some(auth) => {
				info!(user_id = %auth.0.user_id, "inactive user rejected");
				Err(Error::PermissionDenied)
			}
			None => Err(Error::PermissionDenied),
		}
	}
}

// vim: ts=4
