// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant attribute handlers.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use tenancy_server_api::{AttributesResponse, ErrorResponse, SetAttributeRequest};

use crate::{
	api::AppState,
	api_response::{not_found, ApiResult},
	auth_middleware::RequireAuth,
	routes::{admin_access, member_access},
	validation::parse_tenant_id,
};

#[utoipa::path(
    get,
    path = "/tenants/{id}/attributes",
    params(("id" = String, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Attributes with ordered values", body = AttributesResponse),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    tag = "attributes"
)]
#[tracing::instrument(skip(state, current), fields(%id))]
pub async fn list_attributes(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> ApiResult<Json<AttributesResponse>> {
	let tenant_id = parse_tenant_id(&id)?;
	let access = member_access(&state, &current, &tenant_id).await?;
	Ok(Json(AttributesResponse {
		attributes: access.tenant.attributes,
	}))
}

#[utoipa::path(
    put,
    path = "/tenants/{id}/attributes/{key}",
    params(
        ("id" = String, Path, description = "Tenant ID"),
        ("key" = String, Path, description = "Attribute key")
    ),
    request_body = SetAttributeRequest,
    responses(
        (status = 200, description = "Attribute replaced", body = AttributesResponse),
        (status = 400, description = "Blank key", body = ErrorResponse),
        (status = 403, description = "Not a tenant administrator", body = ErrorResponse)
    ),
    tag = "attributes"
)]
#[tracing::instrument(skip(state, current, payload), fields(%id, %key))]
pub async fn set_attribute(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path((id, key)): Path<(String, String)>,
	Json(payload): Json<SetAttributeRequest>,
) -> ApiResult<Json<AttributesResponse>> {
	let tenant_id = parse_tenant_id(&id)?;
	admin_access(&state, &current, &tenant_id).await?;
	state
		.directory
		.set_attribute(&tenant_id, &key, payload.values)
		.await?;
	Ok(Json(AttributesResponse {
		attributes: state.directory.get_attributes(&tenant_id).await?,
	}))
}

#[utoipa::path(
    delete,
    path = "/tenants/{id}/attributes/{key}",
    params(
        ("id" = String, Path, description = "Tenant ID"),
        ("key" = String, Path, description = "Attribute key")
    ),
    responses(
        (status = 204, description = "Attribute removed"),
        (status = 403, description = "Not a tenant administrator", body = ErrorResponse),
        (status = 404, description = "No such attribute", body = ErrorResponse)
    ),
    tag = "attributes"
)]
#[tracing::instrument(skip(state, current), fields(%id, %key))]
pub async fn remove_attribute(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path((id, key)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
	let tenant_id = parse_tenant_id(&id)?;
	admin_access(&state, &current, &tenant_id).await?;
	if !state.directory.remove_attribute(&tenant_id, &key).await? {
		return Err(not_found(format!("attribute {key}")));
	}
	Ok(StatusCode::NO_CONTENT)
}
