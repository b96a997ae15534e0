// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, Json};
use tenancy_server_api::{ErrorResponse, SwitchTenantRequest, TokenResponse};

use crate::{
	api::AppState,
	api_response::ApiResult,
	auth_middleware::RequireAuth,
	routes::login::issue_token_set,
	validation::parse_tenant_id,
};

#[utoipa::path(
    put,
    path = "/switch",
    request_body = SwitchTenantRequest,
    responses(
        (status = 200, description = "Active tenant changed, refreshed tokens", body = TokenResponse),
        (status = 400, description = "Malformed tenant id", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Tenant not available to this session", body = ErrorResponse)
    ),
    tag = "login"
)]
/// Change the active tenant of an established session.
#[tracing::instrument(skip(state, current, payload), fields(user_id = %current.login.user.id))]
pub async fn switch_tenant(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Json(payload): Json<SwitchTenantRequest>,
) -> ApiResult<Json<TokenResponse>> {
	let tenant_id = parse_tenant_id(&payload.tenant_id)?;
	let active = state
		.resolver
		.switch_active_tenant(&current.login, &tenant_id)
		.await?;
	Ok(Json(issue_token_set(&state, &current, &active).await?))
}
