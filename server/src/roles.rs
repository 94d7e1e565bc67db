//! Role assignment handlers. Only system staff may change role rows.

use axum::{
	Json,
	extract::{Path, State},
	http::StatusCode,
};

use insight_core::prelude::*;
use insight_core::{Auth, roles};
use insight_types::role_adapter::{CreateRoleAssignment, RoleAssignment};

fn require_system_staff(user: &insight_types::user_adapter::User) -> ClResult<()> {
	if user.is_system_staff() {
		Ok(())
	} else {
		warn!(user_id = %user.user_id, "role change denied");
		Err(Error::PermissionDenied)
	}
}

/// POST /api/roles
pub async fn post_role(
	State(app): State<App>,
	Auth(user): Auth,
	Json(role): Json<CreateRoleAssignment>,
) -> ClResult<(StatusCode, Json<RoleAssignment>)> {
	require_system_staff(&user)?;
	let created = roles::create_role_assignment(&app, &role).await?;
	Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/roles/{role_id}
pub async fn delete_role(
	State(app): State<App>,
	Auth(user): Auth,
	Path(role_id): Path<i64>,
) -> ClResult<Json<RoleAssignment>> {
	require_system_staff(&user)?;
	let deleted = roles::delete_role_assignment(&app, role_id).await?;
	Ok(Json(deleted))
}

// vim: ts=4
