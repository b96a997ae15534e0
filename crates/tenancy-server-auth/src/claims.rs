// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant claims embedded in issued tokens.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::TenantId;

/// One tenant as seen by a token consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TenantClaim {
	#[schema(value_type = String)]
	pub tenant_id: TenantId,
	pub tenant_name: String,
	/// Sorted ascending.
	pub roles: Vec<String>,
}

/// Tenant portion of a token's claim set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TenantClaims {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub active_tenant: Option<TenantClaim>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub all_tenants: Option<Vec<TenantClaim>>,
}
