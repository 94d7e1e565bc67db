//! Request middlewares

use axum::{
	body::Body,
	extract::State,
	http::{HeaderMap, Request, Response},
	middleware::Next,
};

use insight_core::prelude::*;
use insight_core::Auth;

/// Header carrying the id of the user authenticated by the fronting proxy
pub const USER_HEADER: &str = "x-insight-user-id";

fn user_id_from_headers(headers: &HeaderMap) -> ClResult<Option<UserId>> {
	let Some(value) = headers.get(USER_HEADER) else {
		return Ok(None);
	};
	let user_id = value
		.to_str()
		.ok()
		.and_then(|v| v.trim().parse::<i64>().ok())
		.filter(|id| *id > 0)
		.ok_or_else(|| Error::invalid_input("malformed user header", serde_json::json!({ "header": USER_HEADER })))?;
	Ok(Some(UserId(user_id)))
}

/// Resolves the forwarded user id and stores the user as [`Auth`]. Requests
/// without the header pass through unauthenticated.
pub async fn trusted_user(State(app): State<App>, mut req: Request<Body>, next: Next) -> ClResult<Response<Body>> {
	if let Some(user_id) = user_id_from_headers(req.headers())? {
		let user = match app.user_adapter.read_user(user_id).await {
			Ok(user) => user,
			Err(Error::NotFound) => {
				info!(user_id = %user_id, "forwarded user does not exist");
				return Err(Error::PermissionDenied);
			}
			Err(err) => return Err(err),
		};
		req.extensions_mut().insert(Auth(user));
	}

	Ok(next.run(req).await)
}


// vim: ts=4
