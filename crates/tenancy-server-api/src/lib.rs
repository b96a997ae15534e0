// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod invitations;
pub mod login;
pub mod memberships;
pub mod sessions;
pub mod tenants;

pub use invitations::{CreateInvitationRequest, InvitationResponse, ListInvitationsResponse};
pub use login::{
	CreateTenantForm, InvitationReviewForm, LoginStateResponse, PendingInvitationView,
	ReviewSummary, SelectTenantForm, SwitchTenantRequest, TenantOption, TokenResponse,
};
pub use memberships::{ListMembershipsResponse, MembershipResponse, RolesRequest};
pub use sessions::{CreateAuthSessionRequest, CreateAuthSessionResponse};
pub use tenants::{
	AttributesResponse, CreateTenantRequest, ListTenantsParams, ListTenantsResponse,
	PageParams, SetAttributeRequest, TenantResponse, UpdateTenantRequest,
};

use serde::Serialize;
use utoipa::ToSchema;

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
	/// Machine-readable code such as `conflict` or `access_denied`.
	pub error: String,
	pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
	pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
	pub status: String,
	pub database: String,
	pub version: String,
}
