// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant aggregate: tenants, their memberships and pending invitations.
//!
//! A tenant owns its memberships and invitations. At most one membership exists
//! per (tenant, user) and at most one pending invitation per (tenant, email).
//! An invitation row existing *is* the pending state; accepting or rejecting
//! it removes the row.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::TenancyError;
use crate::types::{InvitationId, MembershipId, RoleSet, TenantId, UserId, TENANT_ADMIN_ROLE};

/// Maximum length of a tenant name, attribute key or role name.
pub const MAX_NAME_LEN: usize = 255;

// =============================================================================
// Tenant
// =============================================================================

/// An organization unit within a realm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
	pub id: TenantId,
	pub realm: String,
	pub name: String,
	/// Free-form attributes; each key maps to an ordered list of values.
	pub attributes: BTreeMap<String, Vec<String>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Tenant {
	/// Create a new tenant with no attributes.
	pub fn new(realm: impl Into<String>, name: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: TenantId::generate(),
			realm: realm.into(),
			name: name.into(),
			attributes: BTreeMap::new(),
			created_at: now,
			updated_at: now,
		}
	}

	/// First value of an attribute, if set.
	pub fn first_attribute(&self, key: &str) -> Option<&str> {
		self
			.attributes
			.get(key)
			.and_then(|values| values.first())
			.map(String::as_str)
	}
}

/// Trim a tenant name and check it is non-blank and within bounds.
pub fn validate_tenant_name(name: &str) -> Result<String, TenancyError> {
	let name = name.trim();
	if name.is_empty() {
		return Err(TenancyError::Validation(
			"tenant name must not be blank".to_string(),
		));
	}
	if name.chars().count() > MAX_NAME_LEN {
		return Err(TenancyError::Validation(format!(
			"tenant name must be at most {MAX_NAME_LEN} characters"
		)));
	}
	Ok(name.to_string())
}

/// Trim an attribute key and check it is non-blank and within bounds.
pub fn validate_attribute_key(key: &str) -> Result<String, TenancyError> {
	let key = key.trim();
	if key.is_empty() {
		return Err(TenancyError::Validation(
			"attribute key must not be blank".to_string(),
		));
	}
	if key.chars().count() > MAX_NAME_LEN {
		return Err(TenancyError::Validation(format!(
			"attribute key must be at most {MAX_NAME_LEN} characters"
		)));
	}
	Ok(key.to_string())
}

/// Trim role names, rejecting blank or oversized ones.
pub fn validate_roles<I, S>(roles: I) -> Result<RoleSet, TenancyError>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	roles
		.into_iter()
		.map(|role| {
			let role = role.as_ref().trim();
			if role.is_empty() {
				Err(TenancyError::Validation(
					"role names must not be blank".to_string(),
				))
			} else if role.chars().count() > MAX_NAME_LEN {
				Err(TenancyError::Validation(format!(
					"role names must be at most {MAX_NAME_LEN} characters"
				)))
			} else {
				Ok(role.to_string())
			}
		})
		.collect()
}

// =============================================================================
// Membership
// =============================================================================

/// A durable grant of named roles to a user within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
	pub id: MembershipId,
	pub tenant_id: TenantId,
	pub user_id: UserId,
	pub roles: RoleSet,
	/// Provenance of automatically created memberships (e.g. `idp:corp-sso`).
	pub provisioned_by: Option<String>,
	pub created_at: DateTime<Utc>,
}

impl Membership {
	pub fn new(tenant_id: TenantId, user_id: UserId, roles: RoleSet) -> Self {
		Self {
			id: MembershipId::generate(),
			tenant_id,
			user_id,
			roles,
			provisioned_by: None,
			created_at: Utc::now(),
		}
	}

	pub fn with_provenance(mut self, provisioned_by: impl Into<String>) -> Self {
		self.provisioned_by = Some(provisioned_by.into());
		self
	}

	pub fn has_role(&self, role: &str) -> bool {
		self.roles.contains(role)
	}

	/// Returns true if this membership may administer its tenant.
	pub fn is_admin(&self) -> bool {
		self.has_role(TENANT_ADMIN_ROLE)
	}
}

// =============================================================================
// Invitation
// =============================================================================

/// A pending offer of membership addressed to an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
	pub id: InvitationId,
	pub tenant_id: TenantId,
	/// Lower-cased recipient address.
	pub email: String,
	/// Roles granted on acceptance.
	pub roles: RoleSet,
	/// `None` for system-issued invitations.
	pub invited_by: Option<UserId>,
	pub created_at: DateTime<Utc>,
	/// `None` means the invitation never expires.
	pub expires_at: Option<DateTime<Utc>>,
}

impl Invitation {
	/// Create a new invitation.
	///
	/// `email` must already be normalized. When `ttl` is given the invitation
	/// expires that long after creation.
	pub fn new(
		tenant_id: TenantId,
		email: impl Into<String>,
		roles: RoleSet,
		invited_by: Option<UserId>,
		ttl: Option<Duration>,
	) -> Self {
		let now = Utc::now();
		Self {
			id: InvitationId::generate(),
			tenant_id,
			email: email.into(),
			roles,
			invited_by,
			created_at: now,
			expires_at: ttl.map(|ttl| now + ttl),
		}
	}

	/// Returns true if this invitation expired before `now`.
	pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
		self.expires_at.is_some_and(|expires_at| now > expires_at)
	}

	/// Returns true if this invitation has expired.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(Utc::now())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::{role_set, TENANT_USER_ROLE};
	use proptest::prelude::*;

	#[test]
	fn tenant_name_is_trimmed() {
		assert_eq!(validate_tenant_name("  Acme  ").unwrap(), "Acme");
	}

	#[test]
	fn blank_tenant_name_is_rejected() {
		assert!(matches!(
			validate_tenant_name(" \t "),
			Err(TenancyError::Validation(_))
		));
	}

	#[test]
	fn overlong_tenant_name_is_rejected() {
		let name = "x".repeat(MAX_NAME_LEN + 1);
		assert!(validate_tenant_name(&name).is_err());
		assert!(validate_tenant_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
	}

	#[test]
	fn blank_role_is_rejected() {
		assert!(validate_roles(["tenant-user", " "]).is_err());
	}

	#[test]
	fn roles_are_trimmed_and_deduplicated() {
		let roles = validate_roles([" viewer", "viewer ", "editor"]).unwrap();
		assert_eq!(roles, role_set(["editor", "viewer"]));
	}

	#[test]
	fn admin_membership_is_admin() {
		let m = Membership::new(
			TenantId::generate(),
			UserId::generate(),
			role_set([TENANT_ADMIN_ROLE]),
		);
		assert!(m.is_admin());
		assert!(!m.has_role(TENANT_USER_ROLE));
	}

	#[test]
	fn invitation_without_ttl_never_expires() {
		let inv = Invitation::new(
			TenantId::generate(),
			"x@y.com",
			role_set([TENANT_USER_ROLE]),
			None,
			None,
		);
		assert!(!inv.is_expired_at(Utc::now() + Duration::days(10_000)));
	}

	#[test]
	fn invitation_with_ttl_expires() {
		let inv = Invitation::new(
			TenantId::generate(),
			"x@y.com",
			role_set([TENANT_USER_ROLE]),
			None,
			Some(Duration::days(7)),
		);
		assert!(!inv.is_expired());
		assert!(inv.is_expired_at(Utc::now() + Duration::days(8)));
	}

	#[test]
	fn first_attribute_reads_head_of_list() {
		let mut tenant = Tenant::new("realm", "Acme");
		tenant
			.attributes
			.insert("region".into(), vec!["eu".into(), "us".into()]);
		assert_eq!(tenant.first_attribute("region"), Some("eu"));
		assert_eq!(tenant.first_attribute("missing"), None);
	}

	proptest! {
		#[test]
		fn non_blank_names_validate(name in "[A-Za-z0-9][A-Za-z0-9 ]{0,100}") {
			let validated = validate_tenant_name(&name).unwrap();
			prop_assert_eq!(validated, name.trim());
		}
	}
}
