// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication configuration.

use serde::Deserialize;

use crate::secret::SecretString;

pub const DEFAULT_REALM: &str = "default";

/// Authentication configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Accept session hand-offs without the host secret.
	pub dev_mode: bool,
	pub environment: String,
	/// Shared secret the identity host presents when registering a login.
	pub host_secret: Option<SecretString>,
	/// Realm every tenant of this server belongs to.
	pub realm: String,
	/// Lifetime of issued access tokens.
	pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
	fn default() -> Self {
		AuthConfigLayer::default().finalize()
	}
}

impl AuthConfig {
	pub fn is_production(&self) -> bool {
		self.environment.eq_ignore_ascii_case("production")
	}
}

/// Authentication configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub dev_mode: Option<bool>,
	#[serde(default)]
	pub environment: Option<String>,
	#[serde(default)]
	pub host_secret: Option<SecretString>,
	#[serde(default)]
	pub realm: Option<String>,
	#[serde(default)]
	pub token_ttl_secs: Option<u64>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.dev_mode.is_some() {
			self.dev_mode = other.dev_mode;
		}
		if other.environment.is_some() {
			self.environment = other.environment;
		}
		if other.host_secret.is_some() {
			self.host_secret = other.host_secret;
		}
		if other.realm.is_some() {
			self.realm = other.realm;
		}
		if other.token_ttl_secs.is_some() {
			self.token_ttl_secs = other.token_ttl_secs;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		AuthConfig {
			dev_mode: self.dev_mode.unwrap_or(false),
			environment: self.environment.unwrap_or_else(|| "development".to_string()),
			host_secret: self.host_secret.filter(|s| !s.expose().is_empty()),
			realm: self
				.realm
				.map(|r| r.trim().to_string())
				.filter(|r| !r.is_empty())
				.unwrap_or_else(|| DEFAULT_REALM.to_string()),
			token_ttl_secs: self.token_ttl_secs.unwrap_or(3600),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = AuthConfig::default();
		assert!(!config.dev_mode);
		assert_eq!(config.environment, "development");
		assert!(config.host_secret.is_none());
		assert_eq!(config.realm, DEFAULT_REALM);
		assert_eq!(config.token_ttl_secs, 3600);
	}

	#[test]
	fn blank_values_fall_back() {
		let config = AuthConfigLayer {
			host_secret: Some(SecretString::new("")),
			realm: Some("  ".to_string()),
			..Default::default()
		}
		.finalize();
		assert!(config.host_secret.is_none());
		assert_eq!(config.realm, DEFAULT_REALM);
	}

	#[test]
	fn production_is_case_insensitive() {
		let config = AuthConfigLayer {
			environment: Some("Production".to_string()),
			..Default::default()
		}
		.finalize();
		assert!(config.is_production());
	}
}
