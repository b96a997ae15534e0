// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Projects directory state into token claims.

use tenancy_server_auth::{TenancyError, TenantClaim, TenantClaims, TenantId, UserId};

use crate::directory::TenantDirectory;

#[derive(Clone)]
pub struct ClaimProjector {
	directory: TenantDirectory,
}

impl ClaimProjector {
	pub fn new(directory: TenantDirectory) -> Self {
		Self { directory }
	}

	/// Build the tenant claims for `user_id`.
	///
	/// `active_tenant` without a matching membership projects to no active
	/// claim. `include_all` adds every membership ordered by tenant name.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn project(
		&self,
		user_id: &UserId,
		active_tenant: Option<&TenantId>,
		include_all: bool,
	) -> Result<TenantClaims, TenancyError> {
		let memberships = self.directory.list_memberships_for_user(user_id).await?;

		let mut claims = Vec::with_capacity(memberships.len());
		for membership in memberships {
			let tenant = self.directory.get_tenant(&membership.tenant_id).await?;
			claims.push(TenantClaim {
				tenant_id: tenant.id,
				tenant_name: tenant.name,
				roles: membership.roles.into_iter().collect(),
			});
		}
		claims.sort_by(|a, b| {
			a.tenant_name
				.cmp(&b.tenant_name)
				.then(a.tenant_id.cmp(&b.tenant_id))
		});

		let active = active_tenant.and_then(|id| claims.iter().find(|c| &c.tenant_id == id).cloned());
		Ok(TenantClaims {
			active_tenant: active,
			all_tenants: include_all.then_some(claims),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::directory_fixture;
	use tenancy_server_auth::{role_set, TENANT_ADMIN_ROLE};
	use tenancy_server_db::testing::create_test_user;

	#[tokio::test]
	async fn projects_active_and_all_tenants() {
		let fx = directory_fixture().await;
		let a = create_test_user(&fx.pool, "a@example.com").await;
		let beta = fx.directory.create_tenant("Beta", &a.id).await.unwrap();
		let acme = fx.directory.create_tenant("Acme", &a.id).await.unwrap();
		let membership = fx
			.directory
			.get_membership_for(&beta.id, &a.id)
			.await
			.unwrap()
			.unwrap();
		fx.directory
			.grant_roles(&membership.id, &role_set(["zeta", "alpha"]))
			.await
			.unwrap();

		let projector = ClaimProjector::new(fx.directory.clone());
		let claims = projector.project(&a.id, Some(&beta.id), true).await.unwrap();

		let active = claims.active_tenant.clone().unwrap();
		assert_eq!(active.tenant_name, "Beta");
		assert_eq!(active.roles, vec!["alpha", TENANT_ADMIN_ROLE, "zeta"]);

		let all = claims.all_tenants.clone().unwrap();
		let names: Vec<_> = all.iter().map(|c| c.tenant_name.as_str()).collect();
		assert_eq!(names, vec!["Acme", "Beta"]);
		assert_eq!(all[0].tenant_id, acme.id);

		let again = projector.project(&a.id, Some(&beta.id), true).await.unwrap();
		assert_eq!(again, claims);
	}

	#[tokio::test]
	async fn stale_active_tenant_projects_nothing() {
		let fx = directory_fixture().await;
		let a = create_test_user(&fx.pool, "a@example.com").await;
		fx.directory.create_tenant("Acme", &a.id).await.unwrap();

		let projector = ClaimProjector::new(fx.directory.clone());
		let claims = projector
			.project(&a.id, Some(&TenantId::generate()), false)
			.await
			.unwrap();
		assert!(claims.active_tenant.is_none());
		assert!(claims.all_tenants.is_none());
	}
}
