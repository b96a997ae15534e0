// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment variables.

use std::path::PathBuf;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::secret::SecretString;
use crate::sections::{
	AuthConfigLayer, DatabaseConfigLayer, HttpConfigLayer, IdentityProvidersConfigLayer,
	InvitationsConfigLayer, LoggingConfigLayer, SmtpConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/tenancy/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `TENANCY_SERVER_<SECTION>_<FIELD>`. Secrets may instead be read
/// from the file named by `<VAR>_FILE`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()),
			logging: Some(load_logging_from_env()),
			auth: Some(load_auth_from_env()?),
			smtp: Some(load_smtp_from_env()?),
			invitations: Some(load_invitations_from_env()?),
			identity_providers: env_var("TENANCY_SERVER_IDP_SCOPES")
				.map(|raw| IdentityProvidersConfigLayer::parse_env(&raw))
				.transpose()?,
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: std::str::FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

/// Read `name`, or the contents of the file named by `name_FILE`.
fn env_secret(name: &str) -> Result<Option<SecretString>, ConfigError> {
	if let Some(value) = env_var(name) {
		return Ok(Some(SecretString::new(value)));
	}
	let file_var = format!("{name}_FILE");
	let Some(path) = env_var(&file_var) else {
		return Ok(None);
	};
	let content = std::fs::read_to_string(&path)
		.map_err(|e| ConfigError::Secret(format!("{file_var}: cannot read {path}: {e}")))?;
	let value = content.trim_end_matches(['\r', '\n']);
	Ok((!value.is_empty()).then(|| SecretString::new(value)))
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("TENANCY_SERVER_HOST"),
		port: env_parse("TENANCY_SERVER_PORT", "u16")?,
		base_url: env_var("TENANCY_SERVER_BASE_URL"),
	})
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("TENANCY_SERVER_DATABASE_URL"),
	}
}

fn load_logging_from_env() -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var("TENANCY_SERVER_LOG_LEVEL"),
	}
}

fn load_auth_from_env() -> Result<AuthConfigLayer, ConfigError> {
	Ok(AuthConfigLayer {
		dev_mode: env_bool("TENANCY_SERVER_AUTH_DEV_MODE"),
		environment: env_var("TENANCY_SERVER_ENV"),
		host_secret: env_secret("TENANCY_SERVER_HOST_SECRET")?,
		realm: env_var("TENANCY_SERVER_REALM"),
		token_ttl_secs: env_parse("TENANCY_SERVER_TOKEN_TTL_SECS", "u64")?,
	})
}

fn load_smtp_from_env() -> Result<SmtpConfigLayer, ConfigError> {
	Ok(SmtpConfigLayer {
		host: env_var("TENANCY_SERVER_SMTP_HOST"),
		port: env_parse("TENANCY_SERVER_SMTP_PORT", "u16")?,
		username: env_var("TENANCY_SERVER_SMTP_USERNAME"),
		password: env_secret("TENANCY_SERVER_SMTP_PASSWORD")?,
		from_address: env_var("TENANCY_SERVER_SMTP_FROM_ADDRESS"),
		from_name: env_var("TENANCY_SERVER_SMTP_FROM_NAME"),
		use_tls: env_bool("TENANCY_SERVER_SMTP_USE_TLS"),
	})
}

fn load_invitations_from_env() -> Result<InvitationsConfigLayer, ConfigError> {
	Ok(InvitationsConfigLayer {
		expiry_days: env_parse("TENANCY_SERVER_INVITATION_EXPIRY_DAYS", "u32")?,
	})
}
