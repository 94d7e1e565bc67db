//! App state type

use std::sync::Arc;

use crate::cache::Cache;
use crate::prelude::*;
use crate::settings::InsightSettings;

use insight_types::learning_adapter::LearningAdapter;
use insight_types::role_adapter::RoleAdapter;
use insight_types::tenant_adapter::TenantConfigAdapter;
use insight_types::user_adapter::UserAdapter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug)]
pub struct AppState {
	pub settings: InsightSettings,
	pub cache: Cache,

	pub tenant_adapter: Arc<dyn TenantConfigAdapter>,
	pub user_adapter: Arc<dyn UserAdapter>,
	pub role_adapter: Arc<dyn RoleAdapter>,
	pub learning_adapter: Arc<dyn LearningAdapter>,
}

pub type App = Arc<AppState>;

#[derive(Default)]
pub struct AppBuilder {
	settings: InsightSettings,
	tenant_adapter: Option<Arc<dyn TenantConfigAdapter>>,
	user_adapter: Option<Arc<dyn UserAdapter>>,
	role_adapter: Option<Arc<dyn RoleAdapter>>,
	learning_adapter: Option<Arc<dyn LearningAdapter>>,
}

impl AppBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn settings(&mut self, settings: InsightSettings) -> &mut Self {
		self.settings = settings;
		self
	}

	pub fn tenant_adapter(&mut self, adapter: Arc<dyn TenantConfigAdapter>) -> &mut Self {
		self.tenant_adapter = Some(adapter);
		self
	}

	pub fn user_adapter(&mut self, adapter: Arc<dyn UserAdapter>) -> &mut Self {
		self.user_adapter = Some(adapter);
		self
	}

	pub fn role_adapter(&mut self, adapter: Arc<dyn RoleAdapter>) -> &mut Self {
		self.role_adapter = Some(adapter);
		self
	}

	pub fn learning_adapter(&mut self, adapter: Arc<dyn LearningAdapter>) -> &mut Self {
		self.learning_adapter = Some(adapter);
		self
	}

	pub fn build(&mut self) -> ClResult<App> {
		let settings = std::mem::take(&mut self.settings);
		let missing = |name: &str| Error::ConfigError(format!("{} adapter is not configured", name));

		let app = AppState {
			cache: Cache::new(settings.cache_capacity),
			tenant_adapter: self.tenant_adapter.take().ok_or_else(|| missing("tenant"))?,
			user_adapter: self.user_adapter.take().ok_or_else(|| missing("user"))?,
			role_adapter: self.role_adapter.take().ok_or_else(|| missing("role"))?,
			learning_adapter: self.learning_adapter.take().ok_or_else(|| missing("learning"))?,
			settings,
		};
		info!(version = VERSION, release = app.settings.platform_release.as_str(), "app state ready");
		Ok(Arc::new(app))
	}
}

// vim: ts=4
