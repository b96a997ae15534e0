// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Registration of verified subjects by the identity host.

use axum::{
	extract::State,
	http::{HeaderMap, StatusCode},
	response::IntoResponse,
	Json,
};
use tenancy_server_api::{CreateAuthSessionRequest, CreateAuthSessionResponse, ErrorResponse};
use tenancy_server_auth::{parse_email, TenancyError, User};

use crate::{
	api::AppState,
	api_response::{ApiError, ApiResult},
	validation::parse_user_session_id,
};

/// Header carrying the shared identity-host secret.
pub const HOST_SECRET_HEADER: &str = "x-host-secret";

fn check_host_secret(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
	if state.auth.dev_mode {
		return Ok(());
	}
	let presented = headers
		.get(HOST_SECRET_HEADER)
		.and_then(|v| v.to_str().ok())
		.unwrap_or_default();
	match &state.auth.host_secret {
		Some(secret) if !presented.is_empty() && secret.matches(presented) => Ok(()),
		_ => {
			tracing::warn!("session hand-off refused: bad host secret");
			Err(ApiError(TenancyError::Unauthenticated))
		}
	}
}

#[utoipa::path(
    post,
    path = "/auth/sessions",
    request_body = CreateAuthSessionRequest,
    responses(
        (status = 201, description = "Authentication session opened", body = CreateAuthSessionResponse),
        (status = 400, description = "Invalid email or session id", body = ErrorResponse),
        (status = 401, description = "Missing or wrong host secret", body = ErrorResponse),
        (status = 403, description = "SSO session belongs to another subject", body = ErrorResponse)
    ),
    tag = "sessions"
)]
/// Register a verified subject and open an authentication session for it.
///
/// Logins brokered by a scoped identity provider get their scoped
/// memberships provisioned before the session token is returned.
#[tracing::instrument(skip_all, fields(identity_provider = ?payload.identity_provider))]
pub async fn create_auth_session(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<CreateAuthSessionRequest>,
) -> ApiResult<impl IntoResponse> {
	check_host_secret(&state, &headers)?;

	let email = parse_email(&payload.email)?;
	let resume = payload
		.sso_session
		.as_deref()
		.filter(|s| !s.trim().is_empty())
		.map(parse_user_session_id)
		.transpose()?;

	let mut subject = User::new(email, payload.email_verified);
	if let Some(name) = payload.display_name.filter(|n| !n.trim().is_empty()) {
		subject = subject.with_display_name(name);
	}
	let mut user = state.users.upsert_user(&subject).await?;
	if let Some(realm_admin) = payload.realm_admin {
		if user.is_realm_admin != realm_admin {
			state.users.set_realm_admin(&user.id, realm_admin).await?;
			user.is_realm_admin = realm_admin;
		}
	}

	let alias = payload.identity_provider.as_deref().map(str::trim).filter(|a| !a.is_empty());
	let session = state
		.sessions
		.open_auth_session(user.id, alias, resume)
		.await?;
	state
		.provisioning
		.provision_scoped_memberships(&user, alias)
		.await?;

	let session_token = state
		.tokens
		.issue_session_token(session.id, state.auth.token_ttl)
		.await;
	tracing::info!(
		user_id = %user.id,
		auth_session_id = %session.id,
		user_session_id = %session.user_session_id,
		"authentication session opened"
	);

	Ok((
		StatusCode::CREATED,
		Json(CreateAuthSessionResponse {
			session_token,
			auth_session_id: session.id.to_string(),
			user_session_id: session.user_session_id.to_string(),
			user_id: user.id.to_string(),
		}),
	))
}
