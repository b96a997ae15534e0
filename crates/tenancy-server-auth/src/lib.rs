// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Domain types for the multi-tenant directory.
//!
//! This crate provides:
//! - The tenant aggregate ([`Tenant`], [`Membership`], [`Invitation`]) and its
//!   validation rules
//! - The [`TenancyError`] taxonomy and its HTTP mapping
//! - Identity-provider tenant scoping ([`IdentityProviderTenantScope`])
//! - The session-note interface to the identity host ([`SessionHost`])
//! - The [`Notifier`] interface for invitation emails
//! - Token claim shapes ([`TenantClaims`])

pub mod claims;
pub mod email;
pub mod error;
pub mod idp;
pub mod notify;
pub mod session;
pub mod tenant;
pub mod token;
pub mod types;
pub mod user;

pub use claims::{TenantClaim, TenantClaims};
pub use email::{is_valid_email, normalize_email, parse_email};
pub use error::TenancyError;
pub use idp::{IdentityProviderScopes, IdentityProviderTenantScope, ScopeParseError};
pub use notify::{LogNotifier, Notifier, NotifyError, TenantNotification};
pub use session::{
	AuthSession, InMemorySessionHost, NoteScope, SessionHost, ACTIVE_TENANT_NOTE,
	IDENTITY_PROVIDER_NOTE, INVITATIONS_REVIEWED_NOTE,
};
pub use tenant::{
	validate_attribute_key, validate_roles, validate_tenant_name, Invitation, Membership, Tenant,
	MAX_NAME_LEN,
};
pub use token::{generate_session_token, hash_token};
pub use types::{
	role_set, AuthSessionId, InvitationId, InvitationOutcome, MembershipId, RoleSet, TenantId,
	UserId, UserSessionId, TENANT_ADMIN_ROLE, TENANT_USER_ROLE,
};
pub use user::User;
