//! Insight server

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod middleware;
mod roles;
mod routes;

use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use insight_core::AppBuilder;
use insight_core::prelude::*;
use insight_core::settings::InsightSettings;
use insight_store_adapter_sqlite::StoreAdapterSqlite;

async fn run() -> ClResult<()> {
	let settings = InsightSettings::from_env()?;

	let store = Arc::new(StoreAdapterSqlite::new(&*settings.db_path, settings.platform_release).await?);
	let listen = settings.listen.clone();
	let app = AppBuilder::new()
		.settings(settings)
		.tenant_adapter(store.clone())
		.user_adapter(store.clone())
		.role_adapter(store.clone())
		.learning_adapter(store)
		.build()?;

	let listener = tokio::net::TcpListener::bind(&*listen).await?;
	info!(listen = %listen, "listening");
	axum::serve(listener, routes::init(app))
		.with_graceful_shutdown(async {
			if let Err(err) = tokio::signal::ctrl_c().await {
				error!("cannot wait for shutdown signal: {}", err);
			}
			info!("shutting down");
		})
		.await?;
	Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	match run().await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("{}", err);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
