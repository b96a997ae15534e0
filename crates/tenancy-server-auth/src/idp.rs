// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity-provider tenant scoping.
//!
//! A brokered identity provider may be limited to an explicit set of tenants.
//! A missing or blank configuration means *unrestricted*, never "zero tenants".

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use crate::types::TenantId;

/// A scope entry that is not a tenant UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tenant id '{0}' in identity provider scope")]
pub struct ScopeParseError(pub String);

/// Tenants that users brokered through one identity provider may resolve into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityProviderTenantScope {
	#[default]
	Unrestricted,
	Restricted(BTreeSet<TenantId>),
}

impl IdentityProviderTenantScope {
	/// Parse an optional comma-separated list of tenant ids.
	///
	/// Whitespace around entries is ignored and empty entries are dropped. A
	/// value with no entries left is unrestricted.
	pub fn parse(raw: Option<&str>) -> Result<Self, ScopeParseError> {
		let Some(raw) = raw else {
			return Ok(Self::Unrestricted);
		};

		let ids = raw
			.split(',')
			.map(str::trim)
			.filter(|entry| !entry.is_empty())
			.map(|entry| {
				entry
					.parse::<TenantId>()
					.map_err(|_| ScopeParseError(entry.to_string()))
			})
			.collect::<Result<BTreeSet<_>, _>>()?;

		if ids.is_empty() {
			Ok(Self::Unrestricted)
		} else {
			Ok(Self::Restricted(ids))
		}
	}

	pub fn is_restricted(&self) -> bool {
		matches!(self, Self::Restricted(_))
	}

	/// Returns true if users of this provider may resolve into `tenant_id`.
	pub fn allows(&self, tenant_id: &TenantId) -> bool {
		match self {
			Self::Unrestricted => true,
			Self::Restricted(ids) => ids.contains(tenant_id),
		}
	}

	/// The listed tenants, or `None` when unrestricted.
	pub fn tenant_ids(&self) -> Option<&BTreeSet<TenantId>> {
		match self {
			Self::Unrestricted => None,
			Self::Restricted(ids) => Some(ids),
		}
	}
}

impl FromStr for IdentityProviderTenantScope {
	type Err = ScopeParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(Some(s))
	}
}

/// Scopes keyed by identity provider alias.
#[derive(Debug, Clone, Default)]
pub struct IdentityProviderScopes {
	by_alias: HashMap<String, IdentityProviderTenantScope>,
}

impl IdentityProviderScopes {
	pub fn new(by_alias: HashMap<String, IdentityProviderTenantScope>) -> Self {
		Self { by_alias }
	}

	/// Parse alias to comma-separated tenant list pairs.
	pub fn from_raw<'a, I>(entries: I) -> Result<Self, ScopeParseError>
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let by_alias = entries
			.into_iter()
			.map(|(alias, raw)| {
				IdentityProviderTenantScope::parse(Some(raw)).map(|scope| (alias.to_string(), scope))
			})
			.collect::<Result<HashMap<_, _>, _>>()?;
		Ok(Self { by_alias })
	}

	/// Scope for a login. Direct logins and unknown aliases are unrestricted.
	pub fn scope_for(&self, alias: Option<&str>) -> IdentityProviderTenantScope {
		alias
			.and_then(|alias| self.by_alias.get(alias))
			.cloned()
			.unwrap_or_default()
	}

	pub fn len(&self) -> usize {
		self.by_alias.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_alias.is_empty()
	}
}
