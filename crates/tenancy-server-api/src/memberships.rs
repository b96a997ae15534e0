// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tenancy_server_auth::Membership;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MembershipResponse {
	pub id: String,
	pub tenant_id: String,
	pub user_id: String,
	pub email: Option<String>,
	/// Sorted ascending.
	pub roles: Vec<String>,
	pub provisioned_by: Option<String>,
	pub created_at: DateTime<Utc>,
}

impl MembershipResponse {
	pub fn new(membership: Membership, email: Option<String>) -> Self {
		Self {
			id: membership.id.to_string(),
			tenant_id: membership.tenant_id.to_string(),
			user_id: membership.user_id.to_string(),
			email,
			roles: membership.roles.into_iter().collect(),
			provisioned_by: membership.provisioned_by,
			created_at: membership.created_at,
		}
	}
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListMembershipsResponse {
	pub memberships: Vec<MembershipResponse>,
	pub total: i64,
}

/// Role names to replace, grant or revoke.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RolesRequest {
	pub roles: Vec<String>,
}
