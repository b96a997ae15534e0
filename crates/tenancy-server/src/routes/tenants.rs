// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant CRUD handlers.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};
use tenancy_server_api::{
	CreateTenantRequest, ErrorResponse, ListTenantsParams, ListTenantsResponse, TenantResponse,
	UpdateTenantRequest,
};
use tenancy_server_auth::TenancyError;
use tenancy_server_db::TenantQuery;

use crate::{
	api::AppState,
	api_response::ApiResult,
	auth_middleware::RequireAuth,
	pagination::offset_limit,
	routes::{admin_access, member_access},
	validation::parse_tenant_id,
};

#[utoipa::path(
    post,
    path = "/tenants",
    request_body = CreateTenantRequest,
    responses(
        (status = 201, description = "Tenant created", body = TenantResponse),
        (status = 400, description = "Blank or over-long name", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse)
    ),
    tag = "tenants"
)]
/// Create a tenant. The caller becomes its administrator.
#[tracing::instrument(skip(state, current, payload), fields(user_id = %current.login.user.id))]
pub async fn create_tenant(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Json(payload): Json<CreateTenantRequest>,
) -> ApiResult<impl IntoResponse> {
	let tenant = state
		.directory
		.create_tenant(&payload.name, &current.login.user.id)
		.await?;
	Ok((StatusCode::CREATED, Json(TenantResponse::from(tenant))))
}

#[utoipa::path(
    get,
    path = "/tenants",
    params(ListTenantsParams),
    responses(
        (status = 200, description = "Tenants ordered by name", body = ListTenantsResponse),
        (status = 400, description = "Incomplete attribute filter", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "tenants"
)]
/// List tenants. Realm administrators see every tenant, other callers see
/// the tenants they belong to.
#[tracing::instrument(skip(state, current), fields(user_id = %current.login.user.id))]
pub async fn list_tenants(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Query(params): Query<ListTenantsParams>,
) -> ApiResult<Json<ListTenantsResponse>> {
	let attribute = match (params.attr_key, params.attr_value) {
		(Some(key), Some(value)) => Some((key, value)),
		(None, None) => None,
		_ => {
			return Err(
				TenancyError::Validation("attr_key and attr_value must be given together".into())
					.into(),
			);
		}
	};
	let (offset, limit) = offset_limit(params.first, params.max);
	let query = TenantQuery {
		search: params.search.filter(|s| !s.trim().is_empty()),
		attribute,
		member: (!current.is_realm_admin()).then_some(current.login.user.id),
		offset,
		limit,
	};

	let (tenants, total) = state.directory.list_tenants(&query).await?;
	Ok(Json(ListTenantsResponse {
		tenants: tenants.into_iter().map(TenantResponse::from).collect(),
		total,
	}))
}

#[utoipa::path(
    get,
    path = "/tenants/{id}",
    params(("id" = String, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant", body = TenantResponse),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Unknown tenant", body = ErrorResponse)
    ),
    tag = "tenants"
)]
#[tracing::instrument(skip(state, current), fields(%id))]
pub async fn get_tenant(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> ApiResult<Json<TenantResponse>> {
	let tenant_id = parse_tenant_id(&id)?;
	let access = member_access(&state, &current, &tenant_id).await?;
	Ok(Json(TenantResponse::from(access.tenant)))
}

#[utoipa::path(
    patch,
    path = "/tenants/{id}",
    params(("id" = String, Path, description = "Tenant ID")),
    request_body = UpdateTenantRequest,
    responses(
        (status = 200, description = "Tenant renamed", body = TenantResponse),
        (status = 403, description = "Not a tenant administrator", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse)
    ),
    tag = "tenants"
)]
#[tracing::instrument(skip(state, current, payload), fields(%id))]
pub async fn update_tenant(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(payload): Json<UpdateTenantRequest>,
) -> ApiResult<Json<TenantResponse>> {
	let tenant_id = parse_tenant_id(&id)?;
	admin_access(&state, &current, &tenant_id).await?;
	let tenant = state
		.directory
		.rename_tenant(&tenant_id, &payload.name)
		.await?;
	Ok(Json(TenantResponse::from(tenant)))
}

#[utoipa::path(
    delete,
    path = "/tenants/{id}",
    params(("id" = String, Path, description = "Tenant ID")),
    responses(
        (status = 204, description = "Tenant deleted with its memberships and invitations"),
        (status = 403, description = "Not a tenant administrator", body = ErrorResponse),
        (status = 404, description = "Unknown tenant", body = ErrorResponse)
    ),
    tag = "tenants"
)]
#[tracing::instrument(skip(state, current), fields(%id))]
pub async fn delete_tenant(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> ApiResult<StatusCode> {
	let tenant_id = parse_tenant_id(&id)?;
	admin_access(&state, &current, &tenant_id).await?;
	state.directory.delete_tenant(&tenant_id).await?;
	Ok(StatusCode::NO_CONTENT)
}
