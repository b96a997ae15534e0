// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for the tenant directory.
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs for tenants, memberships,
//!   invitations, users and sessions, preventing accidental mixing
//! - **Reserved roles**: The two role names the directory itself assigns
//!   ([`TENANT_ADMIN_ROLE`], [`TENANT_USER_ROLE`])
//!
//! All ID types implement transparent serde serialization (as UUID strings) and
//! provide conversion to/from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(
			Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
		)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl std::str::FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s.trim()).map(Self)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(TenantId, "Unique identifier for a tenant.");
define_id_type!(MembershipId, "Unique identifier for a tenant membership.");
define_id_type!(InvitationId, "Unique identifier for a pending invitation.");
define_id_type!(UserId, "Unique identifier for a user.");
define_id_type!(
	AuthSessionId,
	"Unique identifier for a single authentication attempt."
);
define_id_type!(
	UserSessionId,
	"Unique identifier for a long-lived (SSO) user session."
);

// =============================================================================
// Roles
// =============================================================================

/// Role granted to the creator of a tenant.
pub const TENANT_ADMIN_ROLE: &str = "tenant-admin";

/// Minimal role granted by default to invited and provisioned members.
pub const TENANT_USER_ROLE: &str = "tenant-user";

/// Role names held by a membership or offered by an invitation.
///
/// Ordered so that serialized claims are stable for a given snapshot.
pub type RoleSet = BTreeSet<String>;

/// Build a role set from string slices.
pub fn role_set<I, S>(roles: I) -> RoleSet
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	roles.into_iter().map(Into::into).collect()
}

/// Outcome of an invitation once it leaves the pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationOutcome {
	Accepted,
	Rejected,
}

impl fmt::Display for InvitationOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			InvitationOutcome::Accepted => write!(f, "accepted"),
			InvitationOutcome::Rejected => write!(f, "rejected"),
		}
	}
}
