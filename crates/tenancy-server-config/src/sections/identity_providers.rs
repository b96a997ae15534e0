// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant scopes for brokered identity providers.
//!
//! ```toml
//! [identity_providers]
//! corp-okta = "7f0c...,9a41..."
//! partners = ""
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use tenancy_server_auth::IdentityProviderScopes;

use crate::error::ConfigError;

/// Alias to comma-separated tenant id list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct IdentityProvidersConfigLayer {
	pub scopes: BTreeMap<String, String>,
}

impl IdentityProvidersConfigLayer {
	/// Parse `alias=id1,id2;alias2=` as used by the environment source.
	pub fn parse_env(raw: &str) -> Result<Self, ConfigError> {
		let mut scopes = BTreeMap::new();
		for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
			let (alias, tenants) = entry.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
				key: "identity_providers".to_string(),
				message: format!("expected alias=tenant,... but got '{entry}'"),
			})?;
			let alias = alias.trim();
			if alias.is_empty() {
				return Err(ConfigError::InvalidValue {
					key: "identity_providers".to_string(),
					message: format!("missing alias in '{entry}'"),
				});
			}
			scopes.insert(alias.to_string(), tenants.trim().to_string());
		}
		Ok(Self { scopes })
	}

	/// Aliases in `other` replace the same alias here.
	pub fn merge(&mut self, other: IdentityProvidersConfigLayer) {
		self.scopes.extend(other.scopes);
	}

	pub fn finalize(self) -> Result<IdentityProviderScopes, ConfigError> {
		IdentityProviderScopes::from_raw(
			self.scopes
				.iter()
				.map(|(alias, tenants)| (alias.as_str(), tenants.as_str())),
		)
		.map_err(|e| ConfigError::InvalidValue {
			key: "identity_providers".to_string(),
			message: e.to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tenancy_server_auth::{IdentityProviderTenantScope, TenantId};

	const T1: &str = "0191e5b0-0000-7000-8000-000000000001";

	#[test]
	fn parses_env_form() {
		let layer = IdentityProvidersConfigLayer::parse_env(&format!("corp={T1}; open= ;")).unwrap();
		assert_eq!(layer.scopes.len(), 2);

		let scopes = layer.finalize().unwrap();
		let t1: TenantId = T1.parse().unwrap();
		assert!(scopes.scope_for(Some("corp")).allows(&t1));
		assert!(scopes.scope_for(Some("corp")).is_restricted());
		assert_eq!(
			scopes.scope_for(Some("open")),
			IdentityProviderTenantScope::Unrestricted
		);
	}

	#[test]
	fn rejects_entry_without_alias() {
		assert!(IdentityProvidersConfigLayer::parse_env("=abc").is_err());
		assert!(IdentityProvidersConfigLayer::parse_env("corp").is_err());
	}

	#[test]
	fn rejects_malformed_tenant_id() {
		let layer = IdentityProvidersConfigLayer::parse_env("corp=not-a-uuid").unwrap();
		let err = layer.finalize().unwrap_err();
		assert!(err.to_string().contains("not-a-uuid"));
	}

	#[test]
	fn later_layer_replaces_alias() {
		let mut base = IdentityProvidersConfigLayer::parse_env(&format!("corp={T1}")).unwrap();
		base.merge(IdentityProvidersConfigLayer::parse_env("corp=").unwrap());
		let scopes = base.finalize().unwrap();
		assert!(!scopes.scope_for(Some("corp")).is_restricted());
	}

	#[test]
	fn reads_toml_table() {
		let layer: IdentityProvidersConfigLayer =
			toml::from_str(&format!("corp = \"{T1}\"\npartners = \"\"\n")).unwrap();
		assert_eq!(layer.scopes.len(), 2);
	}
}
