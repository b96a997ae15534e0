// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Hand-off of a verified subject from the identity host.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAuthSessionRequest {
	pub email: String,
	#[serde(default)]
	pub email_verified: bool,
	#[serde(default)]
	pub display_name: Option<String>,
	/// Alias of the brokering identity provider, if any.
	#[serde(default)]
	pub identity_provider: Option<String>,
	/// User session of an earlier login to resume (SSO).
	#[serde(default)]
	pub sso_session: Option<String>,
	#[serde(default)]
	pub realm_admin: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAuthSessionResponse {
	/// Bearer token for the login flow endpoints.
	pub session_token: String,
	pub auth_session_id: String,
	pub user_session_id: String,
	pub user_id: String,
}
