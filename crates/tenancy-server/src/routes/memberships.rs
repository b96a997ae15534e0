// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Membership listing, role management and revocation.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use tenancy_server_api::{
	ErrorResponse, ListMembershipsResponse, MembershipResponse, PageParams, RolesRequest,
};
use tenancy_server_auth::{role_set, Membership, MembershipId, RoleSet, TenantId};

use crate::{
	api::AppState,
	api_response::{forbidden, not_found, ApiResult},
	auth_middleware::RequireAuth,
	pagination::offset_limit,
	routes::{admin_access, member_access},
	validation::{parse_membership_id, parse_tenant_id},
};

/// The membership `mid`, provided it belongs to `tenant_id`.
async fn membership_in(
	state: &AppState,
	tenant_id: &TenantId,
	mid: &MembershipId,
) -> ApiResult<Membership> {
	let membership = state.directory.get_membership(mid).await?;
	if &membership.tenant_id != tenant_id {
		return Err(not_found(format!("membership {mid}")));
	}
	Ok(membership)
}

async fn respond(state: &AppState, membership: Membership) -> ApiResult<Json<MembershipResponse>> {
	let email = state
		.users
		.get_user_by_id(&membership.user_id)
		.await?
		.map(|u| u.email);
	Ok(Json(MembershipResponse::new(membership, email)))
}

fn requested_roles(payload: RolesRequest) -> RoleSet {
	role_set(payload.roles)
}

#[utoipa::path(
    get,
    path = "/tenants/{id}/memberships",
    params(("id" = String, Path, description = "Tenant ID"), PageParams),
    responses(
        (status = 200, description = "Memberships of the tenant", body = ListMembershipsResponse),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Unknown tenant", body = ErrorResponse)
    ),
    tag = "memberships"
)]
#[tracing::instrument(skip(state, current, page), fields(%id))]
pub async fn list_memberships(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path(id): Path<String>,
	Query(page): Query<PageParams>,
) -> ApiResult<Json<ListMembershipsResponse>> {
	let tenant_id = parse_tenant_id(&id)?;
	member_access(&state, &current, &tenant_id).await?;
	let (offset, limit) = offset_limit(page.first, page.max);
	let (memberships, total) = state
		.directory
		.list_memberships(&tenant_id, offset, limit)
		.await?;

	let mut out = Vec::with_capacity(memberships.len());
	for membership in memberships {
		let Json(response) = respond(&state, membership).await?;
		out.push(response);
	}
	Ok(Json(ListMembershipsResponse {
		memberships: out,
		total,
	}))
}

#[utoipa::path(
    patch,
    path = "/tenants/{id}/memberships/{mid}/roles",
    params(
        ("id" = String, Path, description = "Tenant ID"),
        ("mid" = String, Path, description = "Membership ID")
    ),
    request_body = RolesRequest,
    responses(
        (status = 200, description = "Roles replaced", body = MembershipResponse),
        (status = 400, description = "Blank role name", body = ErrorResponse),
        (status = 403, description = "Not a tenant administrator", body = ErrorResponse),
        (status = 404, description = "Unknown membership", body = ErrorResponse)
    ),
    tag = "memberships"
)]
#[tracing::instrument(skip(state, current, payload), fields(%id, %mid))]
pub async fn replace_roles(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path((id, mid)): Path<(String, String)>,
	Json(payload): Json<RolesRequest>,
) -> ApiResult<Json<MembershipResponse>> {
	let tenant_id = parse_tenant_id(&id)?;
	let membership_id = parse_membership_id(&mid)?;
	admin_access(&state, &current, &tenant_id).await?;
	membership_in(&state, &tenant_id, &membership_id).await?;
	let membership = state
		.directory
		.replace_roles(&membership_id, &requested_roles(payload))
		.await?;
	respond(&state, membership).await
}

#[utoipa::path(
    patch,
    path = "/tenants/{id}/memberships/{mid}/roles/grant",
    params(
        ("id" = String, Path, description = "Tenant ID"),
        ("mid" = String, Path, description = "Membership ID")
    ),
    request_body = RolesRequest,
    responses(
        (status = 200, description = "Roles added", body = MembershipResponse),
        (status = 403, description = "Not a tenant administrator", body = ErrorResponse),
        (status = 404, description = "Unknown membership", body = ErrorResponse)
    ),
    tag = "memberships"
)]
#[tracing::instrument(skip(state, current, payload), fields(%id, %mid))]
pub async fn grant_roles(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path((id, mid)): Path<(String, String)>,
	Json(payload): Json<RolesRequest>,
) -> ApiResult<Json<MembershipResponse>> {
	let tenant_id = parse_tenant_id(&id)?;
	let membership_id = parse_membership_id(&mid)?;
	admin_access(&state, &current, &tenant_id).await?;
	membership_in(&state, &tenant_id, &membership_id).await?;
	let membership = state
		.directory
		.grant_roles(&membership_id, &requested_roles(payload))
		.await?;
	respond(&state, membership).await
}

#[utoipa::path(
    patch,
    path = "/tenants/{id}/memberships/{mid}/roles/revoke",
    params(
        ("id" = String, Path, description = "Tenant ID"),
        ("mid" = String, Path, description = "Membership ID")
    ),
    request_body = RolesRequest,
    responses(
        (status = 200, description = "Roles removed", body = MembershipResponse),
        (status = 403, description = "Not a tenant administrator", body = ErrorResponse),
        (status = 404, description = "Unknown membership", body = ErrorResponse)
    ),
    tag = "memberships"
)]
#[tracing::instrument(skip(state, current, payload), fields(%id, %mid))]
pub async fn revoke_roles(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path((id, mid)): Path<(String, String)>,
	Json(payload): Json<RolesRequest>,
) -> ApiResult<Json<MembershipResponse>> {
	let tenant_id = parse_tenant_id(&id)?;
	let membership_id = parse_membership_id(&mid)?;
	admin_access(&state, &current, &tenant_id).await?;
	membership_in(&state, &tenant_id, &membership_id).await?;
	let membership = state
		.directory
		.revoke_roles(&membership_id, &requested_roles(payload))
		.await?;
	respond(&state, membership).await
}

#[utoipa::path(
    delete,
    path = "/tenants/{id}/memberships/{mid}",
    params(
        ("id" = String, Path, description = "Tenant ID"),
        ("mid" = String, Path, description = "Membership ID")
    ),
    responses(
        (status = 204, description = "Membership revoked"),
        (status = 403, description = "Not a tenant administrator", body = ErrorResponse),
        (status = 404, description = "Unknown membership", body = ErrorResponse)
    ),
    tag = "memberships"
)]
/// Revoke a membership. Members may always leave a tenant themselves.
#[tracing::instrument(skip(state, current), fields(%id, %mid))]
pub async fn revoke_membership(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path((id, mid)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
	let tenant_id = parse_tenant_id(&id)?;
	let membership_id = parse_membership_id(&mid)?;
	let access = member_access(&state, &current, &tenant_id).await?;
	let target = membership_in(&state, &tenant_id, &membership_id).await?;

	let is_self = target.user_id == current.login.user.id;
	let is_admin = access.membership.as_ref().is_some_and(Membership::is_admin);
	if !is_self && !is_admin && !current.is_realm_admin() {
		return Err(forbidden("tenant administrator role required"));
	}

	if !state.directory.revoke_membership(&membership_id).await? {
		return Err(not_found(format!("membership {mid}")));
	}
	Ok(StatusCode::NO_CONTENT)
}
