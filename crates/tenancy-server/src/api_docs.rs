// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI documentation for tenancy-server.
//!
//! Served interactively at `/api` and as raw JSON at `/api/openapi.json`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tenancy Server API",
        version = "1.0.0",
        description = "Multi-tenant directory: tenants, memberships, invitations and login-time tenant resolution.",
        license(name = "Proprietary"),
        contact(
            name = "Geoffrey Huntley",
            email = "ghuntley@ghuntley.com",
            url = "https://ghuntley.com"
        )
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "health", description = "Health checks"),
        (name = "tenants", description = "Tenant CRUD and listing"),
        (name = "attributes", description = "Multi-valued tenant attributes"),
        (name = "memberships", description = "Tenant memberships and roles"),
        (name = "invitations", description = "Invitations to join a tenant"),
        (name = "login", description = "Tenant resolution during login and token issuance"),
        (name = "sessions", description = "Identity host hand-off")
    ),
    paths(
        crate::routes::health::health_check,
        // Tenants
        crate::routes::tenants::create_tenant,
        crate::routes::tenants::list_tenants,
        crate::routes::tenants::get_tenant,
        crate::routes::tenants::update_tenant,
        crate::routes::tenants::delete_tenant,
        crate::routes::attributes::list_attributes,
        crate::routes::attributes::set_attribute,
        crate::routes::attributes::remove_attribute,
        // Memberships
        crate::routes::memberships::list_memberships,
        crate::routes::memberships::replace_roles,
        crate::routes::memberships::grant_roles,
        crate::routes::memberships::revoke_roles,
        crate::routes::memberships::revoke_membership,
        // Invitations
        crate::routes::invitations::create_invitation,
        crate::routes::invitations::list_invitations,
        crate::routes::invitations::revoke_invitation,
        // Login flow
        crate::routes::login::login_state,
        crate::routes::login::submit_new_tenant,
        crate::routes::login::submit_invitation_review,
        crate::routes::login::submit_selection,
        crate::routes::login::issue_token,
        crate::routes::switch::switch_tenant,
        crate::routes::sessions::create_auth_session,
    ),
    components(
        schemas(
            tenancy_server_api::ErrorResponse,
            tenancy_server_api::SuccessResponse,
            tenancy_server_api::HealthResponse,
            tenancy_server_api::TenantResponse,
            tenancy_server_api::ListTenantsResponse,
            tenancy_server_api::CreateTenantRequest,
            tenancy_server_api::UpdateTenantRequest,
            tenancy_server_api::AttributesResponse,
            tenancy_server_api::SetAttributeRequest,
            tenancy_server_api::MembershipResponse,
            tenancy_server_api::ListMembershipsResponse,
            tenancy_server_api::RolesRequest,
            tenancy_server_api::InvitationResponse,
            tenancy_server_api::ListInvitationsResponse,
            tenancy_server_api::CreateInvitationRequest,
            tenancy_server_api::LoginStateResponse,
            tenancy_server_api::TenantOption,
            tenancy_server_api::PendingInvitationView,
            tenancy_server_api::ReviewSummary,
            tenancy_server_api::CreateTenantForm,
            tenancy_server_api::InvitationReviewForm,
            tenancy_server_api::SelectTenantForm,
            tenancy_server_api::SwitchTenantRequest,
            tenancy_server_api::TokenResponse,
            tenancy_server_api::CreateAuthSessionRequest,
            tenancy_server_api::CreateAuthSessionResponse,
            tenancy_server_auth::TenantClaims,
            tenancy_server_auth::TenantClaim,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn spec_serializes() {
		let spec = ApiDoc::openapi();
		let json = serde_json::to_string_pretty(&spec).unwrap();
		assert!(json.contains("\"openapi\""));
		assert!(json.contains("Tenancy Server API"));
	}

	#[test]
	fn spec_documents_every_route() {
		let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
		for path in [
			"/health",
			"/tenants",
			"/tenants/{id}",
			"/tenants/{id}/attributes/{key}",
			"/tenants/{id}/memberships/{mid}/roles/grant",
			"/tenants/{id}/invitations/{iid}",
			"/switch",
			"/login/tenant",
			"/login/tenant/select",
			"/login/token",
			"/auth/sessions",
		] {
			assert!(json.contains(path), "missing path: {path}");
		}
	}
}
