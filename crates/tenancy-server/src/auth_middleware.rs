// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bearer-token authentication.
//!
//! [`auth_layer`] resolves `Authorization: Bearer <token>` to an
//! authentication session and its subject and stores an [`AuthContext`] in
//! the request extensions. Handlers take [`RequireAuth`] to insist on one.

use axum::{
	body::Body,
	extract::{FromRequestParts, State},
	http::{header::AUTHORIZATION, request::Parts, Request},
	middleware::Next,
	response::Response,
};
use tenancy_server_auth::{TenancyError, UserSessionId};
use tenancy_server_tenants::Login;

use crate::api::AppState;
use crate::api_response::ApiError;
use crate::tokens::TokenKind;

/// The authenticated login behind a request.
#[derive(Debug, Clone)]
pub struct CurrentLogin {
	pub login: Login,
	pub user_session_id: UserSessionId,
	pub token_kind: TokenKind,
}

impl CurrentLogin {
	pub fn is_realm_admin(&self) -> bool {
		self.login.user.is_realm_admin
	}
}

#[derive(Debug, Clone, Default)]
pub struct AuthContext {
	pub current: Option<CurrentLogin>,
}

/// Extractor that rejects unauthenticated requests with 401.
pub struct RequireAuth(pub CurrentLogin);

impl<S> FromRequestParts<S> for RequireAuth
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	#[tracing::instrument(name = "RequireAuth::from_request_parts", skip_all)]
	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		match parts
			.extensions
			.get::<AuthContext>()
			.and_then(|ctx| ctx.current.clone())
		{
			Some(current) => Ok(RequireAuth(current)),
			None => {
				tracing::debug!("Authentication required: no valid credentials");
				Err(ApiError(TenancyError::Unauthenticated))
			}
		}
	}
}

fn bearer_token(request: &Request<Body>) -> Option<&str> {
	request
		.headers()
		.get(AUTHORIZATION)?
		.to_str()
		.ok()?
		.strip_prefix("Bearer ")
		.map(str::trim)
		.filter(|t| !t.is_empty())
}

#[tracing::instrument(
	name = "auth_layer",
	skip(state, request, next),
	fields(
		auth_method = tracing::field::Empty,
		user_id = tracing::field::Empty,
	)
)]
pub async fn auth_layer(
	State(state): State<AppState>,
	mut request: Request<Body>,
	next: Next,
) -> Response {
	let mut ctx = AuthContext::default();

	if let Some(token) = bearer_token(&request) {
		match authenticate(&state, token).await {
			Ok(Some(current)) => {
				let span = tracing::Span::current();
				span.record(
					"auth_method",
					match current.token_kind {
						TokenKind::Session => "session",
						TokenKind::Access => "access",
					},
				);
				span.record("user_id", tracing::field::display(current.login.user.id));
				ctx.current = Some(current);
			}
			Ok(None) => tracing::debug!("bearer token not recognised"),
			Err(e) => tracing::error!(error = %e, "failed to authenticate request"),
		}
	}

	request.extensions_mut().insert(ctx);
	next.run(request).await
}

async fn authenticate(state: &AppState, token: &str) -> Result<Option<CurrentLogin>, TenancyError> {
	let Some(grant) = state.tokens.lookup(token).await else {
		return Ok(None);
	};
	let Some(session) = state.sessions.get_auth_session(&grant.auth_session_id).await else {
		return Ok(None);
	};
	let Some(user) = state.users.get_user_by_id(&session.user_id).await? else {
		return Ok(None);
	};
	Ok(Some(CurrentLogin {
		login: Login {
			auth_session_id: session.id,
			user,
			authenticated_at: session.created_at,
		},
		user_session_id: session.user_session_id,
		token_kind: grant.kind,
	}))
}
