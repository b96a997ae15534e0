// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The tenant directory: invariant-checked operations over the tenant aggregate.

use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tenancy_server_auth::{
	parse_email, role_set, validate_attribute_key, validate_roles, validate_tenant_name, Invitation,
	InvitationId, LogNotifier, Membership, MembershipId, Notifier, RoleSet, TenancyError, Tenant,
	TenantId, TenantNotification, User, UserId, TENANT_ADMIN_ROLE, TENANT_USER_ROLE,
};
use tenancy_server_db::{TenantQuery, TenantStore, UserStore};
use tracing::{info, warn};

use crate::events::{DirectoryEvent, EventSink, TracingEventSink};
use crate::notify::dispatch;

type Result<T> = std::result::Result<T, TenancyError>;

/// Entry point for every tenant, membership, invitation and attribute
/// mutation within one realm.
#[derive(Clone)]
pub struct TenantDirectory {
	tenants: Arc<dyn TenantStore>,
	users: Arc<dyn UserStore>,
	events: Arc<dyn EventSink>,
	notifier: Arc<dyn Notifier>,
	realm: String,
	invitation_ttl: Option<Duration>,
}

impl TenantDirectory {
	pub fn new(
		tenants: Arc<dyn TenantStore>,
		users: Arc<dyn UserStore>,
		realm: impl Into<String>,
	) -> Self {
		Self {
			tenants,
			users,
			events: Arc::new(TracingEventSink),
			notifier: Arc::new(LogNotifier),
			realm: realm.into(),
			invitation_ttl: None,
		}
	}

	pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
		self.events = events;
		self
	}

	pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = notifier;
		self
	}

	/// Invitations created from now on expire after `ttl`. `None` never expires.
	pub fn with_invitation_ttl(mut self, ttl: Option<Duration>) -> Self {
		self.invitation_ttl = ttl;
		self
	}

	pub fn realm(&self) -> &str {
		&self.realm
	}

	pub(crate) fn store(&self) -> &Arc<dyn TenantStore> {
		&self.tenants
	}

	pub(crate) fn user_store(&self) -> &Arc<dyn UserStore> {
		&self.users
	}

	pub(crate) fn notifier(&self) -> &Arc<dyn Notifier> {
		&self.notifier
	}

	// =========================================================================
	// Tenants
	// =========================================================================

	/// Create a tenant and make `creator` its administrator.
	#[tracing::instrument(skip(self), fields(realm = %self.realm, creator = %creator))]
	pub async fn create_tenant(&self, name: &str, creator: &UserId) -> Result<Tenant> {
		let name = validate_tenant_name(name)?;
		let tenant = Tenant::new(self.realm.clone(), name);
		let admin = Membership::new(tenant.id, *creator, role_set([TENANT_ADMIN_ROLE]));

		self.tenants.create_tenant(&tenant, &admin).await?;

		info!(tenant_id = %tenant.id, name = %tenant.name, "tenant created");
		self
			.emit(DirectoryEvent::TenantCreated {
				tenant_id: tenant.id,
				name: tenant.name.clone(),
				creator: *creator,
			})
			.await;
		Ok(tenant)
	}

	pub async fn get_tenant(&self, id: &TenantId) -> Result<Tenant> {
		self
			.tenants
			.get_tenant_by_id(id)
			.await?
			.filter(|tenant| tenant.realm == self.realm)
			.ok_or_else(|| TenancyError::NotFound(format!("tenant {id}")))
	}

	#[tracing::instrument(skip(self), fields(tenant_id = %id))]
	pub async fn rename_tenant(&self, id: &TenantId, name: &str) -> Result<Tenant> {
		let name = validate_tenant_name(name)?;
		self.get_tenant(id).await?;
		if !self.tenants.rename_tenant(id, &name).await? {
			return Err(TenancyError::NotFound(format!("tenant {id}")));
		}
		info!(tenant_id = %id, name = %name, "tenant renamed");
		self.get_tenant(id).await
	}

	/// Delete a tenant with its memberships, invitations and attributes.
	#[tracing::instrument(skip(self), fields(tenant_id = %id))]
	pub async fn delete_tenant(&self, id: &TenantId) -> Result<()> {
		self.get_tenant(id).await?;
		if !self.tenants.delete_tenant(id).await? {
			return Err(TenancyError::NotFound(format!("tenant {id}")));
		}
		info!(tenant_id = %id, "tenant deleted");
		self.emit(DirectoryEvent::TenantDeleted { tenant_id: *id }).await;
		Ok(())
	}

	/// List tenants of this realm ordered by name, with the total match count.
	pub async fn list_tenants(&self, query: &TenantQuery) -> Result<(Vec<Tenant>, i64)> {
		Ok(self.tenants.list_tenants(&self.realm, query).await?)
	}

	pub async fn count_tenants(&self, query: &TenantQuery) -> Result<i64> {
		let query = TenantQuery {
			offset: 0,
			limit: 0,
			..query.clone()
		};
		let (_, total) = self.tenants.list_tenants(&self.realm, &query).await?;
		Ok(total)
	}

	// =========================================================================
	// Attributes
	// =========================================================================

	pub async fn get_attribute(&self, tenant_id: &TenantId, key: &str) -> Result<Vec<String>> {
		self.get_tenant(tenant_id).await?;
		Ok(self.tenants.get_attribute(tenant_id, key.trim()).await?)
	}

	pub async fn get_attributes(&self, tenant_id: &TenantId) -> Result<BTreeMap<String, Vec<String>>> {
		Ok(self.get_tenant(tenant_id).await?.attributes)
	}

	/// Replace the ordered values of an attribute.
	#[tracing::instrument(skip(self, values), fields(tenant_id = %tenant_id))]
	pub async fn set_attribute(&self, tenant_id: &TenantId, key: &str, values: Vec<String>) -> Result<()> {
		let key = validate_attribute_key(key)?;
		self.get_tenant(tenant_id).await?;
		self.tenants.set_attribute(tenant_id, &key, &values).await?;
		Ok(())
	}

	pub async fn remove_attribute(&self, tenant_id: &TenantId, key: &str) -> Result<bool> {
		self.get_tenant(tenant_id).await?;
		Ok(self.tenants.remove_attribute(tenant_id, key.trim()).await?)
	}

	// =========================================================================
	// Memberships
	// =========================================================================

	/// Grant `user` a membership in `tenant_id`.
	#[tracing::instrument(skip(self, roles), fields(tenant_id = %tenant_id, user_id = %user_id))]
	pub async fn grant_membership(
		&self,
		tenant_id: &TenantId,
		user_id: &UserId,
		roles: RoleSet,
	) -> Result<Membership> {
		let roles = validate_roles(&roles)?;
		self
			.insert_membership(Membership::new(*tenant_id, *user_id, roles))
			.await
	}

	/// Grant a membership created by automatic provisioning, recording its origin.
	pub async fn provision_membership(
		&self,
		tenant_id: &TenantId,
		user_id: &UserId,
		provisioned_by: &str,
	) -> Result<Membership> {
		let membership = Membership::new(*tenant_id, *user_id, role_set([TENANT_USER_ROLE]))
			.with_provenance(provisioned_by);
		self.insert_membership(membership).await
	}

	async fn insert_membership(&self, membership: Membership) -> Result<Membership> {
		self.get_tenant(&membership.tenant_id).await?;
		self.tenants.create_membership(&membership).await?;
		info!(
			membership_id = %membership.id,
			tenant_id = %membership.tenant_id,
			user_id = %membership.user_id,
			"membership granted"
		);
		Ok(membership)
	}

	pub async fn get_membership(&self, id: &MembershipId) -> Result<Membership> {
		self
			.tenants
			.get_membership_by_id(id)
			.await?
			.ok_or_else(|| TenancyError::NotFound(format!("membership {id}")))
	}

	pub async fn get_membership_for(
		&self,
		tenant_id: &TenantId,
		user_id: &UserId,
	) -> Result<Option<Membership>> {
		Ok(self.tenants.get_membership(tenant_id, user_id).await?)
	}

	pub async fn list_memberships(
		&self,
		tenant_id: &TenantId,
		offset: i64,
		limit: i64,
	) -> Result<(Vec<Membership>, i64)> {
		self.get_tenant(tenant_id).await?;
		Ok(self
			.tenants
			.list_memberships_for_tenant(tenant_id, offset, limit)
			.await?)
	}

	/// Memberships held by a user in tenants of this realm.
	pub async fn list_memberships_for_user(&self, user_id: &UserId) -> Result<Vec<Membership>> {
		let memberships = self.tenants.list_memberships_for_user(user_id).await?;
		let mut in_realm = Vec::with_capacity(memberships.len());
		for membership in memberships {
			if self.tenant_in_realm(&membership.tenant_id).await? {
				in_realm.push(membership);
			}
		}
		Ok(in_realm)
	}

	/// Revoke a membership and any pending invitation to the member's email in
	/// the same tenant.
	///
	/// Returns `false` if the membership does not exist.
	#[tracing::instrument(skip(self), fields(membership_id = %id))]
	pub async fn revoke_membership(&self, id: &MembershipId) -> Result<bool> {
		let revoked = self.tenants.delete_membership(id).await?;
		if revoked {
			info!(membership_id = %id, "membership revoked");
		}
		Ok(revoked)
	}

	pub async fn grant_roles(&self, id: &MembershipId, roles: &RoleSet) -> Result<Membership> {
		let roles = validate_roles(roles)?;
		if !self.tenants.add_membership_roles(id, &roles).await? {
			return Err(TenancyError::NotFound(format!("membership {id}")));
		}
		self.get_membership(id).await
	}

	pub async fn revoke_roles(&self, id: &MembershipId, roles: &RoleSet) -> Result<Membership> {
		let roles = validate_roles(roles)?;
		if !self.tenants.remove_membership_roles(id, &roles).await? {
			return Err(TenancyError::NotFound(format!("membership {id}")));
		}
		self.get_membership(id).await
	}

	pub async fn replace_roles(&self, id: &MembershipId, roles: &RoleSet) -> Result<Membership> {
		let roles = validate_roles(roles)?;
		if !self.tenants.replace_membership_roles(id, &roles).await? {
			return Err(TenancyError::NotFound(format!("membership {id}")));
		}
		self.get_membership(id).await
	}

	// =========================================================================
	// Invitations
	// =========================================================================

	/// Invite `email` to a tenant and notify the invitee.
	///
	/// Roles default to `tenant-user` when none are given.
	#[tracing::instrument(skip(self, inviter, roles), fields(tenant_id = %tenant_id))]
	pub async fn add_invitation(
		&self,
		tenant_id: &TenantId,
		email: &str,
		inviter: Option<&User>,
		roles: Option<RoleSet>,
	) -> Result<Invitation> {
		let email = parse_email(email)?;
		let roles = match roles {
			Some(roles) if !roles.is_empty() => validate_roles(&roles)?,
			_ => role_set([TENANT_USER_ROLE]),
		};
		let tenant = self.get_tenant(tenant_id).await?;

		if let Some(existing) = self.users.get_user_by_email(&email).await? {
			if self
				.tenants
				.get_membership(tenant_id, &existing.id)
				.await?
				.is_some()
			{
				return Err(TenancyError::Conflict(
					"email already belongs to a member of this tenant".to_string(),
				));
			}
		}

		self.purge_expired_invitations().await?;

		let invitation = Invitation::new(
			*tenant_id,
			email,
			roles,
			inviter.map(|u| u.id),
			self.invitation_ttl,
		);
		self.tenants.create_invitation(&invitation).await?;
		info!(invitation_id = %invitation.id, tenant_id = %tenant_id, "invitation created");

		dispatch(
			&self.notifier,
			invitation.email.clone(),
			TenantNotification::Invited {
				tenant_name: tenant.name,
				inviter_name: inviter.map(|u| u.label().to_string()),
				roles: invitation.roles.clone(),
			},
		);
		Ok(invitation)
	}

	/// A pending, unexpired invitation. Expired invitations are removed.
	pub async fn get_invitation(&self, id: &InvitationId) -> Result<Invitation> {
		let invitation = self
			.tenants
			.get_invitation_by_id(id)
			.await?
			.ok_or_else(|| TenancyError::NotFound(format!("invitation {id}")))?;

		if invitation.is_expired() {
			self.tenants.delete_invitation(id).await?;
			tracing::debug!(invitation_id = %id, "expired invitation removed");
			return Err(TenancyError::NotFound(format!("invitation {id}")));
		}
		Ok(invitation)
	}

	#[tracing::instrument(skip(self), fields(invitation_id = %id))]
	pub async fn revoke_invitation(&self, id: &InvitationId) -> Result<bool> {
		let revoked = self.tenants.delete_invitation(id).await?;
		if revoked {
			info!(invitation_id = %id, "invitation revoked");
		}
		Ok(revoked)
	}

	pub async fn list_invitations(
		&self,
		tenant_id: &TenantId,
		offset: i64,
		limit: i64,
	) -> Result<(Vec<Invitation>, i64)> {
		self.get_tenant(tenant_id).await?;
		self.purge_expired_invitations().await?;
		Ok(self
			.tenants
			.list_invitations_for_tenant(tenant_id, offset, limit)
			.await?)
	}

	/// Pending invitations addressed to `email` across this realm's tenants.
	pub async fn list_invitations_for_email(&self, email: &str) -> Result<Vec<Invitation>> {
		let email = parse_email(email)?;
		self.purge_expired_invitations().await?;
		let invitations = self.tenants.list_invitations_for_email(&email).await?;
		let mut in_realm = Vec::with_capacity(invitations.len());
		for invitation in invitations {
			if self.tenant_in_realm(&invitation.tenant_id).await? {
				in_realm.push(invitation);
			}
		}
		Ok(in_realm)
	}

	async fn purge_expired_invitations(&self) -> Result<()> {
		let purged = self.tenants.delete_expired_invitations(Utc::now()).await?;
		if purged > 0 {
			tracing::debug!(count = purged, "expired invitations removed");
		}
		Ok(())
	}

	// =========================================================================
	// Users
	// =========================================================================

	pub async fn get_user(&self, id: &UserId) -> Result<User> {
		self
			.users
			.get_user_by_id(id)
			.await?
			.ok_or_else(|| TenancyError::NotFound(format!("user {id}")))
	}

	async fn tenant_in_realm(&self, tenant_id: &TenantId) -> Result<bool> {
		Ok(self
			.tenants
			.get_tenant_by_id(tenant_id)
			.await?
			.is_some_and(|tenant| tenant.realm == self.realm))
	}

	async fn emit(&self, event: DirectoryEvent) {
		if let Err(e) = self.events.publish(&event).await {
			warn!(sink = self.events.name(), event = event.name(), error = %e, "event sink publish failed");
		}
	}
}
