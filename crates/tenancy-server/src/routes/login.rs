// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backend for the tenant screens shown during login.
//!
//! Every handler answers with the current [`LoginStateResponse`] so the
//! challenge renderer knows which screen, if any, to show next. A refused
//! submission re-prompts with `error` set; an error fatal to the login ends
//! the authentication session and revokes its tokens.

use axum::{
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	Form, Json,
};
use tenancy_server_api::{
	CreateTenantForm, ErrorResponse, InvitationReviewForm, LoginStateResponse,
	PendingInvitationView, ReviewSummary, SelectTenantForm, TenantOption, TokenResponse,
};
use tenancy_server_auth::{TenancyError, TenantId};
use tenancy_server_tenants::{Evaluation, RequiredStep, Resolution, ReviewOutcome};

use crate::{
	api::AppState,
	api_response::{ApiError, ApiResult},
	auth_middleware::{CurrentLogin, RequireAuth},
	validation::{parse_tenant_id, parse_tenant_id_list},
};

/// Build the screen context for an evaluation.
async fn build_login_state(state: &AppState, evaluation: Evaluation) -> ApiResult<LoginStateResponse> {
	let active_tenant = match evaluation.active_tenant {
		Some(id) => Some(TenantOption::from(&state.directory.get_tenant(&id).await?)),
		None => None,
	};

	let mut tenants = Vec::new();
	let mut invitations = Vec::new();
	for step in &evaluation.steps {
		match step {
			RequiredStep::NeedsInvitationReview { invitations: pending } => {
				for invitation in pending {
					let tenant = state.directory.get_tenant(&invitation.tenant_id).await?;
					invitations.push(PendingInvitationView {
						invitation_id: invitation.id.to_string(),
						tenant_id: tenant.id.to_string(),
						tenant_name: tenant.name,
						roles: invitation.roles.iter().cloned().collect(),
					});
				}
			}
			RequiredStep::NeedsTenantSelection { tenants: eligible } => {
				tenants.extend(eligible.iter().map(TenantOption::from));
			}
			RequiredStep::NeedsTenant => {}
		}
	}

	let max_auth_age = evaluation.steps.first().and_then(RequiredStep::max_auth_age);
	let pending_steps: Vec<String> = evaluation
		.steps
		.iter()
		.map(|s| s.name().to_string())
		.collect();
	Ok(LoginStateResponse {
		status: if pending_steps.is_empty() {
			"resolved"
		} else {
			"step_required"
		}
		.to_string(),
		required_step: pending_steps.first().cloned(),
		pending_steps,
		max_auth_age,
		active_tenant,
		tenants,
		invitations,
		review: None,
		error: None,
	})
}

/// End the login on a fatal error and convert it for the response.
async fn fail_login(state: &AppState, current: &CurrentLogin, error: TenancyError) -> ApiError {
	if error.is_fatal_to_login() {
		let auth_session_id = current.login.auth_session_id;
		state.sessions.close_auth_session(&auth_session_id).await;
		let revoked = state.tokens.revoke_session(&auth_session_id).await;
		tracing::warn!(
			auth_session_id = %auth_session_id,
			user_id = %current.login.user.id,
			revoked,
			error = %error,
			"login ended"
		);
	}
	ApiError(error)
}

/// Answer a step submission: the new state, a re-prompt or a fatal error.
async fn after_submission(
	state: &AppState,
	current: &CurrentLogin,
	submitted: Result<Option<ReviewOutcome>, TenancyError>,
) -> Result<Response, ApiError> {
	let (status, review, error) = match submitted {
		Ok(outcome) => (StatusCode::OK, outcome.map(review_summary), None),
		Err(e) if e.is_fatal_to_login() => return Err(fail_login(state, current, e).await),
		Err(e) => {
			tracing::debug!(error = %e, "login step re-prompted");
			let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
			(status, None, Some(e.public_message()))
		}
	};

	let evaluation = match state.resolver.evaluate(&current.login).await {
		Ok(evaluation) => evaluation,
		Err(e) => return Err(fail_login(state, current, e).await),
	};
	let mut body = build_login_state(state, evaluation).await?;
	body.review = review;
	body.error = error;
	Ok((status, Json(body)).into_response())
}

fn review_summary(outcome: ReviewOutcome) -> ReviewSummary {
	ReviewSummary {
		accepted: outcome
			.accepted
			.iter()
			.map(|m| m.tenant_id.to_string())
			.collect(),
		rejected: outcome.rejected.iter().map(ToString::to_string).collect(),
		still_pending: outcome.still_pending,
	}
}

async fn apply_review(
	state: &AppState,
	current: &CurrentLogin,
	form: &InvitationReviewForm,
) -> Result<ReviewOutcome, TenancyError> {
	let accepted = parse_tenant_id_list(&form.accepted_tenants)?;
	let rejected = parse_tenant_id_list(&form.rejected_tenants)?;
	let (outcome, _) = state
		.resolver
		.submit_invitation_review(&current.login, &accepted, &rejected)
		.await?;
	Ok(outcome)
}

/// A blank choice re-prompts; anything unparseable is an invalid selection.
async fn apply_selection(
	state: &AppState,
	current: &CurrentLogin,
	raw: &str,
) -> Result<Resolution, TenancyError> {
	if raw.trim().is_empty() {
		return Err(TenancyError::Validation("choose a tenant to continue".to_string()));
	}
	let tenant_id = parse_tenant_id(raw)
		.map_err(|_| TenancyError::AccessDenied("invalid tenant selection".to_string()))?;
	state.resolver.submit_selection(&current.login, &tenant_id).await
}

#[utoipa::path(
    get,
    path = "/login/tenant",
    responses(
        (status = 200, description = "Resolution state and screen context", body = LoginStateResponse),
        (status = 401, description = "No authentication session", body = ErrorResponse),
        (status = 403, description = "No tenant is available to this login", body = ErrorResponse)
    ),
    tag = "login"
)]
/// Evaluate the tenant resolution table for the current login.
#[tracing::instrument(skip(state, current), fields(auth_session_id = %current.login.auth_session_id))]
pub async fn login_state(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
) -> ApiResult<Json<LoginStateResponse>> {
	let evaluation = match state.resolver.evaluate(&current.login).await {
		Ok(evaluation) => evaluation,
		Err(e) => return Err(fail_login(&state, &current, e).await),
	};
	Ok(Json(build_login_state(&state, evaluation).await?))
}

#[utoipa::path(
    post,
    path = "/login/tenant/create",
    request_body(content = CreateTenantForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Tenant created, next state", body = LoginStateResponse),
        (status = 400, description = "Blank name, re-prompt", body = LoginStateResponse),
        (status = 409, description = "Name taken, re-prompt", body = LoginStateResponse)
    ),
    tag = "login"
)]
#[tracing::instrument(skip(state, current, form), fields(auth_session_id = %current.login.auth_session_id))]
pub async fn submit_new_tenant(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Form(form): Form<CreateTenantForm>,
) -> Result<Response, ApiError> {
	let submitted = state
		.resolver
		.submit_new_tenant(&current.login, &form.tenant_name)
		.await
		.map(|_| None);
	after_submission(&state, &current, submitted).await
}

#[utoipa::path(
    post,
    path = "/login/tenant/invitations",
    request_body(content = InvitationReviewForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Review applied, next state", body = LoginStateResponse),
        (status = 400, description = "Nothing accepted or malformed id, re-prompt", body = LoginStateResponse)
    ),
    tag = "login"
)]
#[tracing::instrument(skip(state, current, form), fields(auth_session_id = %current.login.auth_session_id))]
pub async fn submit_invitation_review(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Form(form): Form<InvitationReviewForm>,
) -> Result<Response, ApiError> {
	let submitted = apply_review(&state, &current, &form).await.map(Some);
	after_submission(&state, &current, submitted).await
}

#[utoipa::path(
    post,
    path = "/login/tenant/select",
    request_body(content = SelectTenantForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Tenant recorded", body = LoginStateResponse),
        (status = 400, description = "No tenant chosen, re-prompt", body = LoginStateResponse),
        (status = 403, description = "Tenant not available, login ended", body = ErrorResponse)
    ),
    tag = "login"
)]
#[tracing::instrument(skip(state, current, form), fields(auth_session_id = %current.login.auth_session_id))]
pub async fn submit_selection(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Form(form): Form<SelectTenantForm>,
) -> Result<Response, ApiError> {
	let submitted = apply_selection(&state, &current, &form.tenant)
		.await
		.map(|_| None);
	after_submission(&state, &current, submitted).await
}

#[utoipa::path(
    post,
    path = "/login/token",
    responses(
        (status = 200, description = "Access token with tenant claims", body = TokenResponse),
        (status = 400, description = "Tenant resolution incomplete", body = ErrorResponse),
        (status = 403, description = "No tenant is available to this login", body = ErrorResponse)
    ),
    tag = "login"
)]
/// Issue an access token once the login has resolved to a tenant.
#[tracing::instrument(skip(state, current), fields(auth_session_id = %current.login.auth_session_id))]
pub async fn issue_token(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
) -> ApiResult<Json<TokenResponse>> {
	let evaluation = match state.resolver.evaluate(&current.login).await {
		Ok(evaluation) => evaluation,
		Err(e) => return Err(fail_login(&state, &current, e).await),
	};
	if let Some(step) = evaluation.steps.first() {
		return Err(ApiError(TenancyError::Validation(format!(
			"tenant resolution incomplete: {}",
			step.name()
		))));
	}
	let Some(active) = evaluation.active_tenant else {
		return Err(ApiError(TenancyError::Internal(
			"resolved login without an active tenant".to_string(),
		)));
	};
	Ok(Json(issue_token_set(&state, &current, &active).await?))
}

/// Issue an access token for the login and project its tenant claims.
pub(crate) async fn issue_token_set(
	state: &AppState,
	current: &CurrentLogin,
	active: &TenantId,
) -> ApiResult<TokenResponse> {
	let user = &current.login.user;
	let tenants = state.claims.project(&user.id, Some(active), true).await?;
	let access_token = state
		.tokens
		.issue_access_token(current.login.auth_session_id, state.auth.token_ttl)
		.await;
	tracing::info!(user_id = %user.id, tenant_id = %active, "access token issued");
	Ok(TokenResponse {
		access_token,
		token_type: "Bearer".to_string(),
		expires_in: u64::try_from(state.auth.token_ttl.num_seconds()).unwrap_or(0),
		sub: user.id.to_string(),
		email: user.email.clone(),
		tenants,
	})
}
