// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Invitation management for tenant administrators.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};
use tenancy_server_api::{
	CreateInvitationRequest, ErrorResponse, InvitationResponse, ListInvitationsResponse, PageParams,
};
use tenancy_server_auth::role_set;

use crate::{
	api::AppState,
	api_response::{not_found, ApiResult},
	auth_middleware::RequireAuth,
	pagination::offset_limit,
	routes::admin_access,
	validation::{parse_invitation_id, parse_tenant_id},
};

#[utoipa::path(
    post,
    path = "/tenants/{id}/invitations",
    params(("id" = String, Path, description = "Tenant ID")),
    request_body = CreateInvitationRequest,
    responses(
        (status = 201, description = "Invitation created and sent", body = InvitationResponse),
        (status = 400, description = "Invalid email", body = ErrorResponse),
        (status = 403, description = "Not a tenant administrator", body = ErrorResponse),
        (status = 409, description = "Already invited or already a member", body = ErrorResponse)
    ),
    tag = "invitations"
)]
/// Invite an email address. Roles default to `tenant-user`.
#[tracing::instrument(skip(state, current, payload), fields(%id))]
pub async fn create_invitation(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(payload): Json<CreateInvitationRequest>,
) -> ApiResult<impl IntoResponse> {
	let tenant_id = parse_tenant_id(&id)?;
	admin_access(&state, &current, &tenant_id).await?;
	let invitation = state
		.directory
		.add_invitation(
			&tenant_id,
			&payload.email,
			Some(&current.login.user),
			payload.roles.map(role_set),
		)
		.await?;
	Ok((StatusCode::CREATED, Json(InvitationResponse::from(invitation))))
}

#[utoipa::path(
    get,
    path = "/tenants/{id}/invitations",
    params(("id" = String, Path, description = "Tenant ID"), PageParams),
    responses(
        (status = 200, description = "Pending invitations", body = ListInvitationsResponse),
        (status = 403, description = "Not a tenant administrator", body = ErrorResponse)
    ),
    tag = "invitations"
)]
#[tracing::instrument(skip(state, current, page), fields(%id))]
pub async fn list_invitations(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path(id): Path<String>,
	Query(page): Query<PageParams>,
) -> ApiResult<Json<ListInvitationsResponse>> {
	let tenant_id = parse_tenant_id(&id)?;
	admin_access(&state, &current, &tenant_id).await?;
	let (offset, limit) = offset_limit(page.first, page.max);
	let (invitations, total) = state
		.directory
		.list_invitations(&tenant_id, offset, limit)
		.await?;
	Ok(Json(ListInvitationsResponse {
		invitations: invitations
			.into_iter()
			.map(InvitationResponse::from)
			.collect(),
		total,
	}))
}

#[utoipa::path(
    delete,
    path = "/tenants/{id}/invitations/{iid}",
    params(
        ("id" = String, Path, description = "Tenant ID"),
        ("iid" = String, Path, description = "Invitation ID")
    ),
    responses(
        (status = 204, description = "Invitation revoked"),
        (status = 403, description = "Not a tenant administrator", body = ErrorResponse),
        (status = 404, description = "Unknown invitation", body = ErrorResponse)
    ),
    tag = "invitations"
)]
#[tracing::instrument(skip(state, current), fields(%id, %iid))]
pub async fn revoke_invitation(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path((id, iid)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
	let tenant_id = parse_tenant_id(&id)?;
	let invitation_id = parse_invitation_id(&iid)?;
	admin_access(&state, &current, &tenant_id).await?;

	let invitation = state.directory.get_invitation(&invitation_id).await?;
	if invitation.tenant_id != tenant_id || !state.directory.revoke_invitation(&invitation_id).await? {
		return Err(not_found(format!("invitation {iid}")));
	}
	Ok(StatusCode::NO_CONTENT)
}
