// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenancy server binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tenancy_server::{create_app_state, create_router};
use tenancy_server_auth::{LogNotifier, Notifier};
use tenancy_server_email::{EmailNotifier, SmtpClient};
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tenancy server - HTTP server for the multi-tenant directory.
#[derive(Parser, Debug)]
#[command(name = "tenancy-server", about = "Multi-tenant directory server", version)]
struct Args {
	/// Configuration file, overriding the system-wide one.
	#[arg(long, env = "TENANCY_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
}

fn format_version_info() -> String {
	format!(
		"tenancy-server version: {}\nPlatform:               {}-{}",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH,
	)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => tenancy_server_config::load_config_with_file(path)?,
		None => tenancy_server_config::load_config()?,
	};

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
		realm = %config.auth.realm,
		"starting tenancy-server"
	);

	let pool = tenancy_server_db::create_pool(&config.database.url).await?;
	tenancy_server_db::run_migrations(&pool).await?;

	let notifier: Arc<dyn Notifier> = match &config.smtp {
		Some(smtp) => {
			let client = SmtpClient::new(smtp)?;
			if let Err(e) = client.check_health().await {
				tracing::warn!(error = %e, "SMTP server unreachable at startup");
			}
			Arc::new(EmailNotifier::new(Arc::new(client), config.http.base_url.clone()))
		}
		None => {
			tracing::info!("SMTP not configured, invitation emails are logged only");
			Arc::new(LogNotifier)
		}
	};

	let state = create_app_state(pool, &config, notifier);
	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	let addr = config.socket_addr();
	tracing::info!(addr = %addr, "listening");
	let listener = tokio::net::TcpListener::bind(&addr).await?;

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

	Ok(())
}
