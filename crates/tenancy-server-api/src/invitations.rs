// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tenancy_server_auth::Invitation;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvitationResponse {
	pub id: String,
	pub tenant_id: String,
	pub email: String,
	pub roles: Vec<String>,
	pub invited_by: Option<String>,
	pub created_at: DateTime<Utc>,
	pub expires_at: Option<DateTime<Utc>>,
}

impl From<Invitation> for InvitationResponse {
	fn from(invitation: Invitation) -> Self {
		Self {
			id: invitation.id.to_string(),
			tenant_id: invitation.tenant_id.to_string(),
			email: invitation.email,
			roles: invitation.roles.into_iter().collect(),
			invited_by: invitation.invited_by.map(|id| id.to_string()),
			created_at: invitation.created_at,
			expires_at: invitation.expires_at,
		}
	}
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListInvitationsResponse {
	pub invitations: Vec<InvitationResponse>,
	pub total: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInvitationRequest {
	pub email: String,
	/// Defaults to `tenant-user`.
	#[serde(default)]
	pub roles: Option<Vec<String>>,
}
