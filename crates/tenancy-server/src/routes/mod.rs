// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP route handlers.

pub mod attributes;
pub mod health;
pub mod invitations;
pub mod login;
pub mod memberships;
pub mod sessions;
pub mod switch;
pub mod tenants;

use tenancy_server_auth::{Membership, Tenant, TenantId};

use crate::api::AppState;
use crate::api_response::{forbidden, ApiResult};
use crate::auth_middleware::CurrentLogin;

/// What the caller may do inside one tenant.
pub(crate) struct TenantAccess {
	pub tenant: Tenant,
	pub membership: Option<Membership>,
}

/// Load a tenant the caller belongs to. Realm admins see every tenant.
pub(crate) async fn member_access(
	state: &AppState,
	current: &CurrentLogin,
	tenant_id: &TenantId,
) -> ApiResult<TenantAccess> {
	let tenant = state.directory.get_tenant(tenant_id).await?;
	let membership = state
		.directory
		.get_membership_for(tenant_id, &current.login.user.id)
		.await?;
	if membership.is_none() && !current.is_realm_admin() {
		return Err(forbidden("not a member of this tenant"));
	}
	Ok(TenantAccess { tenant, membership })
}

/// Load a tenant the caller administers.
pub(crate) async fn admin_access(
	state: &AppState,
	current: &CurrentLogin,
	tenant_id: &TenantId,
) -> ApiResult<TenantAccess> {
	let access = member_access(state, current, tenant_id).await?;
	let is_admin = access.membership.as_ref().is_some_and(Membership::is_admin);
	if !is_admin && !current.is_realm_admin() {
		return Err(forbidden("tenant administrator role required"));
	}
	Ok(access)
}
