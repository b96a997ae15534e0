// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Membership provisioning for logins brokered by a scoped identity provider.

use std::sync::Arc;
use tenancy_server_auth::{IdentityProviderScopes, Membership, TenancyError, User};
use tracing::{info, warn};

use crate::directory::TenantDirectory;

/// Provenance recorded on memberships created for provider `alias`.
pub fn provenance(alias: &str) -> String {
	format!("idp:{alias}")
}

#[derive(Clone)]
pub struct ScopedProvisioning {
	directory: TenantDirectory,
	scopes: Arc<IdentityProviderScopes>,
}

impl ScopedProvisioning {
	pub fn new(directory: TenantDirectory, scopes: Arc<IdentityProviderScopes>) -> Self {
		Self { directory, scopes }
	}

	/// Ensure `user` is a member of every tenant the provider is scoped to.
	///
	/// Unknown tenants are skipped and logged; existing memberships are left
	/// untouched. Returns the memberships created by this call.
	#[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
	pub async fn provision_scoped_memberships(
		&self,
		user: &User,
		alias: Option<&str>,
	) -> Result<Vec<Membership>, TenancyError> {
		let Some(alias) = alias else {
			return Ok(Vec::new());
		};
		let scope = self.scopes.scope_for(Some(alias));
		let Some(tenant_ids) = scope.tenant_ids() else {
			return Ok(Vec::new());
		};

		let provisioned_by = provenance(alias);
		let mut created = Vec::new();
		for tenant_id in tenant_ids {
			if self
				.directory
				.get_membership_for(tenant_id, &user.id)
				.await?
				.is_some()
			{
				continue;
			}

			match self
				.directory
				.provision_membership(tenant_id, &user.id, &provisioned_by)
				.await
			{
				Ok(membership) => created.push(membership),
				Err(TenancyError::NotFound(_)) => {
					warn!(tenant_id = %tenant_id, alias = %alias, "scoped tenant does not exist, skipping");
				}
				// Granted concurrently by another login.
				Err(TenancyError::Conflict(_)) => {}
				Err(e) => return Err(e),
			}
		}

		if !created.is_empty() {
			info!(alias = %alias, count = created.len(), "scoped memberships provisioned");
		}
		Ok(created)
	}
}
