// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tenancy_server_auth::Tenant;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantResponse {
	pub id: String,
	pub realm: String,
	pub name: String,
	pub attributes: BTreeMap<String, Vec<String>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<Tenant> for TenantResponse {
	fn from(tenant: Tenant) -> Self {
		Self {
			id: tenant.id.to_string(),
			realm: tenant.realm,
			name: tenant.name,
			attributes: tenant.attributes,
			created_at: tenant.created_at,
			updated_at: tenant.updated_at,
		}
	}
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListTenantsResponse {
	pub tenants: Vec<TenantResponse>,
	/// Matching tenants before paging.
	pub total: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTenantRequest {
	pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTenantRequest {
	pub name: String,
}

/// `first`/`max` paging used by every list endpoint.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PageParams {
	/// Offset of the first result.
	pub first: Option<i64>,
	/// Maximum number of results.
	pub max: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListTenantsParams {
	/// Case-insensitive substring of the tenant name.
	pub search: Option<String>,
	pub first: Option<i64>,
	pub max: Option<i64>,
	/// Attribute key; combined with `attr_value` for an exact-value filter.
	pub attr_key: Option<String>,
	pub attr_value: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttributesResponse {
	pub attributes: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAttributeRequest {
	pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tenant_response_carries_attributes() {
		let mut tenant = Tenant::new("default", "Acme");
		tenant
			.attributes
			.insert("region".to_string(), vec!["eu".to_string()]);
		let response = TenantResponse::from(tenant.clone());
		assert_eq!(response.id, tenant.id.to_string());
		let json = serde_json::to_value(&response).unwrap();
		assert_eq!(json["attributes"]["region"][0], "eu");
	}
}
