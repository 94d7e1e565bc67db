use axum::{
	Router, middleware,
	routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use insight_core::App;
use insight_stats::handler;

use crate::middleware::trusted_user;
use crate::roles;

pub fn init(app: App) -> Router {
	Router::new()
		.route("/api/statistics/total_counts", get(handler::get_total_counts))
		.route("/api/statistics/aggregated_counts", get(handler::get_aggregated_counts))
		.route("/api/statistics/rating", get(handler::get_global_rating))
		.route("/api/statistics/learners", get(handler::list_learners))
		.route("/api/statistics/live/{tn_id}", get(handler::get_live_statistics))
		.route("/api/roles", post(roles::post_role))
		.route("/api/roles/{role_id}", delete(roles::delete_role))
		.layer(middleware::from_fn_with_state(app.clone(), trusted_user))
		.layer(TraceLayer::new_for_http())
		.with_state(app)
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::body::Body;
	use axum::http::{Request, StatusCode};
	use std::sync::Arc;
	use tower::ServiceExt;

	use insight_core::AppBuilder;
	use insight_core::settings::InsightSettings;
	use insight_store_adapter_sqlite::StoreAdapterSqlite;
	use insight_types::release::PlatformRelease;
	use insight_types::user_adapter::User;
	use insight_types::types::UserId;

	async fn setup(dir: &tempfile::TempDir) -> Router {
		let store =
			Arc::new(StoreAdapterSqlite::new(dir.path().join("insight.db"), PlatformRelease::Redwood).await.unwrap());
		let learner = User {
			user_id: UserId(2),
			username: "learner".into(),
			email: "learner@example.com".into(),
			name: None,
			is_active: true,
			is_staff: false,
			is_superuser: false,
		};
		store.create_user(&learner).await.unwrap();

		let app = AppBuilder::new()
			.settings(InsightSettings::default())
			.tenant_adapter(store.clone())
			.user_adapter(store.clone())
			.role_adapter(store.clone())
			.learning_adapter(store)
			.build()
			.unwrap();
		init(app)
	}

	async fn status(router: &Router, uri: &str, user: Option<&str>) -> StatusCode {
		let mut req = Request::get(uri);
		if let Some(user) = user {
			req = req.header(crate::middleware::USER_HEADER, user);
		}
		router.clone().oneshot(req.body(Body::empty()).unwrap()).await.unwrap().status()
	}

	#[tokio::test]
	async fn test_requests_need_a_known_user() {
		let dir = tempfile::tempdir().unwrap();
		let router = setup(&dir).await;

		assert_eq!(status(&router, "/api/statistics/total_counts?stats=courses", None).await, StatusCode::FORBIDDEN);
		assert_eq!(status(&router, "/api/statistics/live/1", Some("999")).await, StatusCode::FORBIDDEN);
		assert_eq!(status(&router, "/api/statistics/live/1", Some("nobody")).await, StatusCode::BAD_REQUEST);
		// a plain learner reaches no tenant, so the page is empty
		assert_eq!(status(&router, "/api/statistics/learners", Some("2")).await, StatusCode::OK);
		assert_eq!(status(&router, "/api/statistics/live/1", Some("2")).await, StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn test_period_and_rating_routes() {
		let dir = tempfile::tempdir().unwrap();
		let router = setup(&dir).await;

		let uri = "/api/statistics/aggregated_counts?stats=enrollments&aggregate_period=week";
		assert_eq!(status(&router, uri, Some("2")).await, StatusCode::BAD_REQUEST);
		let uri = "/api/statistics/aggregated_counts?stats=enrollments&aggregate_period=month";
		assert_eq!(status(&router, uri, Some("2")).await, StatusCode::OK);
		assert_eq!(status(&router, "/api/statistics/rating", Some("2")).await, StatusCode::OK);
		assert_eq!(status(&router, "/api/statistics/rating", None).await, StatusCode::FORBIDDEN);
	}
}

// vim: ts=4
