// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the tenancy server.
//!
//! Sources are layered defaults, then a TOML file, then `TENANCY_SERVER_*`
//! environment variables. Each later source overrides individual fields of
//! the earlier ones.
//!
//! ```ignore
//! let config = tenancy_server_config::load_config()?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod secret;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use secret::{SecretString, REDACTED};
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::Path;
use tenancy_server_auth::IdentityProviderScopes;
use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub auth: AuthConfig,
	pub smtp: Option<SmtpConfig>,
	pub invitations: InvitationsConfig,
	pub identity_providers: IdentityProviderScopes,
}

impl ServerConfig {
	/// Socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from the system config file and the environment.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_config_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from the environment only.
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	load_config_from_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource)])
}

/// Load configuration with an explicit config file in place of the system one.
pub fn load_config_with_file(path: impl AsRef<Path>) -> Result<ServerConfig, ConfigError> {
	load_config_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(path.as_ref())),
		Box::new(EnvSource),
	])
}

/// Merge `sources` in precedence order and finalize the result.
pub fn load_config_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let auth = layer.auth.unwrap_or_default().finalize();
	let smtp = match layer.smtp {
		Some(smtp) => smtp.build()?,
		None => None,
	};
	let invitations = layer.invitations.unwrap_or_default().finalize();
	let identity_providers = layer.identity_providers.unwrap_or_default().finalize()?;

	validate_config(&auth)?;

	info!(
		host = %http.host,
		port = http.port,
		database = %database.url,
		realm = %auth.realm,
		dev_mode = auth.dev_mode,
		smtp_configured = smtp.is_some(),
		invitation_expiry_days = ?invitations.expiry_days,
		scoped_providers = identity_providers.len(),
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		database,
		logging,
		auth,
		smtp,
		invitations,
		identity_providers,
	})
}

fn validate_config(auth: &AuthConfig) -> Result<(), ConfigError> {
	if auth.dev_mode && auth.is_production() {
		return Err(ConfigError::Validation(
			"dev_mode cannot be enabled in production environment (security risk)".to_string(),
		));
	}
	if !auth.dev_mode && auth.host_secret.is_none() {
		return Err(ConfigError::Validation(
			"auth.host_secret is required unless dev_mode is enabled".to_string(),
		));
	}
	Ok(())
}
