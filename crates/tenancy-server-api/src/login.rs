// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Login-flow screens and token issuance.

use serde::{Deserialize, Serialize};
use tenancy_server_auth::{Tenant, TenantClaims};
use utoipa::ToSchema;

/// Where a login stands, plus everything needed to render the next screen.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginStateResponse {
	/// `resolved` or `step_required`.
	pub status: String,
	/// `review_invitations`, `create_tenant` or `select_tenant`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub required_step: Option<String>,
	/// Every triggered step in presentation order.
	pub pending_steps: Vec<String>,
	/// Re-authentication window of the required step, in seconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_auth_age: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub active_tenant: Option<TenantOption>,
	/// Tenants offered on the selection screen.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tenants: Vec<TenantOption>,
	/// Invitations offered on the review screen.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub invitations: Vec<PendingInvitationView>,
	/// Result of the invitation review just submitted.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub review: Option<ReviewSummary>,
	/// Set when the previous submission was refused and the step re-prompts.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TenantOption {
	pub id: String,
	pub name: String,
}

impl From<&Tenant> for TenantOption {
	fn from(tenant: &Tenant) -> Self {
		Self {
			id: tenant.id.to_string(),
			name: tenant.name.clone(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PendingInvitationView {
	pub invitation_id: String,
	pub tenant_id: String,
	pub tenant_name: String,
	pub roles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewSummary {
	pub accepted: Vec<String>,
	pub rejected: Vec<String>,
	pub still_pending: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantForm {
	#[serde(default)]
	pub tenant_name: String,
}

/// Comma-separated tenant ids.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationReviewForm {
	#[serde(default)]
	pub accepted_tenants: String,
	#[serde(default)]
	pub rejected_tenants: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectTenantForm {
	#[serde(default)]
	pub tenant: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwitchTenantRequest {
	pub tenant_id: String,
}

/// Opaque access token plus the claim set it carries.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
	pub access_token: String,
	pub token_type: String,
	pub expires_in: u64,
	pub sub: String,
	pub email: String,
	#[serde(flatten)]
	pub tenants: TenantClaims,
}
