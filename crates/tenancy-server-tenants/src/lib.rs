// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant directory services.
//!
//! - [`TenantDirectory`]: tenants, memberships, invitations and attributes
//! - [`InvitationLifecycle`]: accept, reject and batch review of invitations
//! - [`TenantResolver`]: the login-time tenant resolution state machine
//! - [`ScopedProvisioning`]: memberships implied by a scoped identity provider
//! - [`ClaimProjector`]: tenant claims for issued tokens

pub mod claims;
pub mod directory;
pub mod events;
pub mod invitation;
mod notify;
pub mod resolution;
pub mod scoping;

#[cfg(test)]
mod testing;

pub use claims::ClaimProjector;
pub use directory::TenantDirectory;
pub use events::{DirectoryEvent, EventSink, EventSinkError, TracingEventSink};
pub use invitation::{InvitationLifecycle, ReviewOutcome};
pub use resolution::{
	reauthentication_required, Evaluation, Login, RequiredStep, Resolution, TenantResolver,
	TENANT_SELECTION_MAX_AUTH_AGE,
};
pub use scoping::{provenance, ScopedProvisioning};
