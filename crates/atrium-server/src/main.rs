// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Atrium workspace server binary.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atrium_server::{create_app_state, create_router};
use atrium_server_db::SessionRepository;

/// Atrium server - HTTP server for the Atrium workspace application.
#[derive(Parser, Debug)]
#[command(name = "atrium-server", about = "Atrium workspace server", version)]
struct Args {
	/// Path to a TOML config file (overrides /etc/atrium/server.toml)
	#[arg(long)]
	config: Option<PathBuf>,
}

/// How often expired sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Load .env file if present
	dotenvy::dotenv().ok();

	// Load configuration
	let config = match args.config {
		Some(path) => atrium_server_config::load_config_with_file(path)?,
		None => atrium_server_config::load_config()?,
	};

	// Setup tracing
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		invite_ttl_days = config.invitations.ttl_days,
		"starting atrium-server"
	);

	// Create database pool and run migrations
	let pool = atrium_server::db::create_pool(&config.database.url).await?;
	atrium_server::db::run_migrations(&pool).await?;

	let state = create_app_state(pool.clone(), &config, None);

	// Periodic cleanup of expired sessions
	{
		let session_repo = SessionRepository::new(pool.clone());
		tokio::spawn(async move {
			let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
			loop {
				interval.tick().await;
				if let Err(e) = session_repo.delete_expired(chrono::Utc::now()).await {
					tracing::warn!(error = %e, "session sweep failed");
				}
			}
		});
	}

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	// Start server
	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	// Run server with graceful shutdown
	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
