// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant repository for database operations.
//!
//! This module provides database access for the tenant aggregate:
//! - Tenant CRUD with realm-scoped unique names
//! - Tenant attributes (ordered multi-valued, long values hashed)
//! - Memberships and their role sets
//! - Pending invitations (row existence is the pending state)
//!
//! Uniqueness is enforced by table constraints. Violations surface as
//! [`DbError::Conflict`] so concurrent duplicate creates never overwrite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::{sqlite::SqlitePool, Row, Sqlite};
use std::collections::BTreeMap;
use tenancy_server_auth::{
	Invitation, InvitationId, Membership, MembershipId, RoleSet, Tenant, TenantId, UserId,
};
use uuid::Uuid;

use crate::error::DbError;
use crate::timestamp::{format_timestamp, parse_timestamp};

/// Attribute values longer than this are stored in the long-value column.
pub const LONG_VALUE_THRESHOLD: usize = 255;

/// Filters and paging for tenant listings.
#[derive(Debug, Clone, Default)]
pub struct TenantQuery {
	/// Case-insensitive substring of the tenant name.
	pub search: Option<String>,
	/// Attribute equality filter: (key, value).
	pub attribute: Option<(String, String)>,
	/// Only tenants this user is a member of.
	pub member: Option<UserId>,
	pub offset: i64,
	pub limit: i64,
}

#[async_trait]
pub trait TenantStore: Send + Sync {
	async fn create_tenant(&self, tenant: &Tenant, admin: &Membership) -> Result<(), DbError>;
	async fn get_tenant_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DbError>;
	async fn rename_tenant(&self, id: &TenantId, name: &str) -> Result<bool, DbError>;
	async fn delete_tenant(&self, id: &TenantId) -> Result<bool, DbError>;
	async fn list_tenants(
		&self,
		realm: &str,
		query: &TenantQuery,
	) -> Result<(Vec<Tenant>, i64), DbError>;
	async fn get_attribute(&self, tenant_id: &TenantId, key: &str) -> Result<Vec<String>, DbError>;
	async fn set_attribute(
		&self,
		tenant_id: &TenantId,
		key: &str,
		values: &[String],
	) -> Result<(), DbError>;
	async fn remove_attribute(&self, tenant_id: &TenantId, key: &str) -> Result<bool, DbError>;
	async fn create_membership(&self, membership: &Membership) -> Result<(), DbError>;
	async fn get_membership_by_id(&self, id: &MembershipId) -> Result<Option<Membership>, DbError>;
	async fn get_membership(
		&self,
		tenant_id: &TenantId,
		user_id: &UserId,
	) -> Result<Option<Membership>, DbError>;
	async fn list_memberships_for_tenant(
		&self,
		tenant_id: &TenantId,
		offset: i64,
		limit: i64,
	) -> Result<(Vec<Membership>, i64), DbError>;
	async fn list_memberships_for_user(&self, user_id: &UserId) -> Result<Vec<Membership>, DbError>;
	async fn add_membership_roles(&self, id: &MembershipId, roles: &RoleSet) -> Result<bool, DbError>;
	async fn remove_membership_roles(
		&self,
		id: &MembershipId,
		roles: &RoleSet,
	) -> Result<bool, DbError>;
	async fn replace_membership_roles(
		&self,
		id: &MembershipId,
		roles: &RoleSet,
	) -> Result<bool, DbError>;
	async fn delete_membership(&self, id: &MembershipId) -> Result<bool, DbError>;
	async fn create_invitation(&self, invitation: &Invitation) -> Result<(), DbError>;
	async fn get_invitation_by_id(&self, id: &InvitationId) -> Result<Option<Invitation>, DbError>;
	async fn list_invitations_for_tenant(
		&self,
		tenant_id: &TenantId,
		offset: i64,
		limit: i64,
	) -> Result<(Vec<Invitation>, i64), DbError>;
	async fn list_invitations_for_email(&self, email: &str) -> Result<Vec<Invitation>, DbError>;
	async fn delete_invitation(&self, id: &InvitationId) -> Result<bool, DbError>;
	async fn accept_invitation(
		&self,
		id: &InvitationId,
		user_id: &UserId,
	) -> Result<Option<Membership>, DbError>;
	async fn delete_expired_invitations(&self, now: DateTime<Utc>) -> Result<u64, DbError>;
}

/// Repository for tenant database operations.
///
/// Manages tenants, their attributes, memberships and invitations.
/// All IDs are UUIDs stored as strings in SQLite.
#[derive(Clone)]
pub struct TenantRepository {
	pool: SqlitePool,
}

const TENANT_FILTER: &str = r#"
	WHERE t.realm = ?1
		AND (?2 IS NULL OR t.name_lower LIKE ?2 ESCAPE '\')
		AND (?3 IS NULL OR EXISTS (
			SELECT 1 FROM tenant_memberships m
			WHERE m.tenant_id = t.id AND m.user_id = ?3
		))
		AND (?4 IS NULL OR EXISTS (
			SELECT 1 FROM tenant_attributes a
			WHERE a.tenant_id = t.id AND a.name = ?4
				AND ((?6 IS NULL AND a.value = ?5) OR (a.long_value_hash = ?6 AND a.long_value = ?5))
		))
"#;

impl TenantRepository {
	/// Create a new repository with the given pool.
	///
	/// # Arguments
	/// * `pool` - SQLite connection pool
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	// =========================================================================
	// Tenant CRUD
	// =========================================================================

	/// Create a tenant and its initial administrator membership atomically.
	///
	/// # Arguments
	/// * `tenant` - The tenant to create, including any initial attributes
	/// * `admin` - Membership granted to the creator
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the name is already used in the realm.
	///
	/// # Database Constraints
	/// - `(realm, name)` must be unique
	/// - `admin.user_id` must reference an existing user
	#[tracing::instrument(skip(self, tenant, admin), fields(tenant_id = %tenant.id, name = %tenant.name))]
	pub async fn create_tenant(&self, tenant: &Tenant, admin: &Membership) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;

		sqlx::query(
			r#"
			INSERT INTO tenants (id, realm, name, name_lower, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(tenant.id.to_string())
		.bind(&tenant.realm)
		.bind(&tenant.name)
		.bind(fold_case(&tenant.name))
		.bind(format_timestamp(tenant.created_at))
		.bind(format_timestamp(tenant.updated_at))
		.execute(&mut *tx)
		.await
		.map_err(|e| DbError::from_write(e, "tenant name already in use"))?;

		for (key, values) in &tenant.attributes {
			insert_attribute_values(&mut tx, &tenant.id, key, values).await?;
		}

		insert_membership(&mut tx, admin).await?;

		tx.commit().await?;
		tracing::debug!(tenant_id = %tenant.id, admin_id = %admin.user_id, "tenant created");
		Ok(())
	}

	/// Get a tenant by ID, including its attributes.
	///
	/// # Returns
	/// `None` if no tenant exists with this ID.
	#[tracing::instrument(skip(self), fields(tenant_id = %id))]
	pub async fn get_tenant_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, realm, name, created_at, updated_at
			FROM tenants
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(row) => Ok(Some(self.load_tenant(&row).await?)),
			None => Ok(None),
		}
	}

	/// Rename a tenant.
	///
	/// # Returns
	/// `false` if no tenant exists with this ID.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the name is already used in the realm.
	#[tracing::instrument(skip(self), fields(tenant_id = %id))]
	pub async fn rename_tenant(&self, id: &TenantId, name: &str) -> Result<bool, DbError> {
		let result =
			sqlx::query("UPDATE tenants SET name = ?, name_lower = ?, updated_at = ? WHERE id = ?")
				.bind(name)
				.bind(fold_case(name))
				.bind(format_timestamp(Utc::now()))
				.bind(id.to_string())
				.execute(&self.pool)
				.await
				.map_err(|e| DbError::from_write(e, "tenant name already in use"))?;

		Ok(result.rows_affected() > 0)
	}

	/// Delete a tenant with its attributes, memberships and invitations.
	///
	/// # Returns
	/// `false` if no tenant exists with this ID.
	#[tracing::instrument(skip(self), fields(tenant_id = %id))]
	pub async fn delete_tenant(&self, id: &TenantId) -> Result<bool, DbError> {
		let id_str = id.to_string();
		let mut tx = self.pool.begin().await?;

		sqlx::query("DELETE FROM tenant_attributes WHERE tenant_id = ?")
			.bind(&id_str)
			.execute(&mut *tx)
			.await?;
		sqlx::query("DELETE FROM tenant_invitations WHERE tenant_id = ?")
			.bind(&id_str)
			.execute(&mut *tx)
			.await?;
		sqlx::query(
			r#"
			DELETE FROM tenant_membership_roles
			WHERE membership_id IN (SELECT id FROM tenant_memberships WHERE tenant_id = ?)
			"#,
		)
		.bind(&id_str)
		.execute(&mut *tx)
		.await?;
		sqlx::query("DELETE FROM tenant_memberships WHERE tenant_id = ?")
			.bind(&id_str)
			.execute(&mut *tx)
			.await?;
		let result = sqlx::query("DELETE FROM tenants WHERE id = ?")
			.bind(&id_str)
			.execute(&mut *tx)
			.await?;

		if result.rows_affected() == 0 {
			return Ok(false);
		}

		tx.commit().await?;
		tracing::debug!(tenant_id = %id, "tenant deleted");
		Ok(true)
	}

	/// List tenants of a realm ordered by name.
	///
	/// # Returns
	/// The requested page and the total number of matching tenants.
	#[tracing::instrument(skip(self, query), fields(offset = query.offset, limit = query.limit))]
	pub async fn list_tenants(
		&self,
		realm: &str,
		query: &TenantQuery,
	) -> Result<(Vec<Tenant>, i64), DbError> {
		let search = query
			.search
			.as_deref()
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(like_pattern);
		let member = query.member.map(|id| id.to_string());
		let (attr_key, attr_value, attr_hash) = match &query.attribute {
			Some((key, value)) => (
				Some(key.clone()),
				Some(value.clone()),
				is_long_value(value).then(|| hash_value(value)),
			),
			None => (None, None, None),
		};

		let count_sql = format!("SELECT COUNT(*) FROM tenants t {TENANT_FILTER}");
		let total: i64 = sqlx::query_scalar(&count_sql)
			.bind(realm)
			.bind(&search)
			.bind(&member)
			.bind(&attr_key)
			.bind(&attr_value)
			.bind(&attr_hash)
			.fetch_one(&self.pool)
			.await?;

		let list_sql = format!(
			"SELECT t.id, t.realm, t.name, t.created_at, t.updated_at FROM tenants t {TENANT_FILTER} \
			 ORDER BY t.name ASC, t.id ASC LIMIT ?7 OFFSET ?8"
		);
		let rows = sqlx::query(&list_sql)
			.bind(realm)
			.bind(&search)
			.bind(&member)
			.bind(&attr_key)
			.bind(&attr_value)
			.bind(&attr_hash)
			.bind(query.limit)
			.bind(query.offset)
			.fetch_all(&self.pool)
			.await?;

		let mut tenants = Vec::with_capacity(rows.len());
		for row in &rows {
			tenants.push(self.load_tenant(row).await?);
		}
		Ok((tenants, total))
	}

	// =========================================================================
	// Attributes
	// =========================================================================

	/// Get the ordered values of one attribute. Empty if unset.
	#[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
	pub async fn get_attribute(&self, tenant_id: &TenantId, key: &str) -> Result<Vec<String>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT value, long_value
			FROM tenant_attributes
			WHERE tenant_id = ? AND name = ?
			ORDER BY position ASC
			"#,
		)
		.bind(tenant_id.to_string())
		.bind(key)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(attribute_value).collect()
	}

	/// Replace the values of one attribute. An empty list removes it.
	///
	/// # Errors
	/// Returns `DbError::NotFound` if the tenant does not exist.
	#[tracing::instrument(skip(self, values), fields(tenant_id = %tenant_id, count = values.len()))]
	pub async fn set_attribute(
		&self,
		tenant_id: &TenantId,
		key: &str,
		values: &[String],
	) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;

		sqlx::query("DELETE FROM tenant_attributes WHERE tenant_id = ? AND name = ?")
			.bind(tenant_id.to_string())
			.bind(key)
			.execute(&mut *tx)
			.await?;

		insert_attribute_values(&mut tx, tenant_id, key, values).await?;

		let touched = sqlx::query("UPDATE tenants SET updated_at = ? WHERE id = ?")
			.bind(format_timestamp(Utc::now()))
			.bind(tenant_id.to_string())
			.execute(&mut *tx)
			.await?;
		if touched.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("tenant {tenant_id}")));
		}

		tx.commit().await?;
		tracing::debug!(tenant_id = %tenant_id, key = %key, "attribute set");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
	pub async fn remove_attribute(&self, tenant_id: &TenantId, key: &str) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM tenant_attributes WHERE tenant_id = ? AND name = ?")
			.bind(tenant_id.to_string())
			.bind(key)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	// =========================================================================
	// Memberships
	// =========================================================================

	/// Create a membership with its roles.
	///
	/// # Errors
	/// - `DbError::Conflict` if the user already has a membership in the tenant
	/// - `DbError::NotFound` if the tenant or user does not exist
	#[tracing::instrument(skip(self, membership), fields(tenant_id = %membership.tenant_id, user_id = %membership.user_id))]
	pub async fn create_membership(&self, membership: &Membership) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;
		insert_membership(&mut tx, membership).await?;
		tx.commit().await?;
		tracing::debug!(membership_id = %membership.id, "membership created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(membership_id = %id))]
	pub async fn get_membership_by_id(&self, id: &MembershipId) -> Result<Option<Membership>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, tenant_id, user_id, provisioned_by, created_at
			FROM tenant_memberships
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(row) => Ok(Some(self.load_membership(&row).await?)),
			None => Ok(None),
		}
	}

	/// Get the membership of a user in a tenant.
	#[tracing::instrument(skip(self), fields(tenant_id = %tenant_id, user_id = %user_id))]
	pub async fn get_membership(
		&self,
		tenant_id: &TenantId,
		user_id: &UserId,
	) -> Result<Option<Membership>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, tenant_id, user_id, provisioned_by, created_at
			FROM tenant_memberships
			WHERE tenant_id = ? AND user_id = ?
			"#,
		)
		.bind(tenant_id.to_string())
		.bind(user_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(row) => Ok(Some(self.load_membership(&row).await?)),
			None => Ok(None),
		}
	}

	/// List memberships of a tenant in creation order.
	#[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
	pub async fn list_memberships_for_tenant(
		&self,
		tenant_id: &TenantId,
		offset: i64,
		limit: i64,
	) -> Result<(Vec<Membership>, i64), DbError> {
		let total: i64 =
			sqlx::query_scalar("SELECT COUNT(*) FROM tenant_memberships WHERE tenant_id = ?")
				.bind(tenant_id.to_string())
				.fetch_one(&self.pool)
				.await?;

		let rows = sqlx::query(
			r#"
			SELECT id, tenant_id, user_id, provisioned_by, created_at
			FROM tenant_memberships
			WHERE tenant_id = ?
			ORDER BY created_at ASC, id ASC
			LIMIT ? OFFSET ?
			"#,
		)
		.bind(tenant_id.to_string())
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		let mut memberships = Vec::with_capacity(rows.len());
		for row in &rows {
			memberships.push(self.load_membership(row).await?);
		}
		Ok((memberships, total))
	}

	/// List every membership held by a user.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn list_memberships_for_user(&self, user_id: &UserId) -> Result<Vec<Membership>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, tenant_id, user_id, provisioned_by, created_at
			FROM tenant_memberships
			WHERE user_id = ?
			ORDER BY created_at ASC, id ASC
			"#,
		)
		.bind(user_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		let mut memberships = Vec::with_capacity(rows.len());
		for row in &rows {
			memberships.push(self.load_membership(row).await?);
		}
		Ok(memberships)
	}

	/// Grant roles to a membership. Roles already held are left alone.
	///
	/// # Returns
	/// `false` if the membership does not exist.
	#[tracing::instrument(skip(self, roles), fields(membership_id = %id))]
	pub async fn add_membership_roles(&self, id: &MembershipId, roles: &RoleSet) -> Result<bool, DbError> {
		let mut tx = self.pool.begin().await?;
		if !membership_exists(&mut tx, id).await? {
			return Ok(false);
		}
		insert_roles(&mut tx, id, roles).await?;
		tx.commit().await?;
		Ok(true)
	}

	/// Revoke roles from a membership. Roles not held are ignored.
	#[tracing::instrument(skip(self, roles), fields(membership_id = %id))]
	pub async fn remove_membership_roles(
		&self,
		id: &MembershipId,
		roles: &RoleSet,
	) -> Result<bool, DbError> {
		let mut tx = self.pool.begin().await?;
		if !membership_exists(&mut tx, id).await? {
			return Ok(false);
		}
		for role in roles {
			sqlx::query("DELETE FROM tenant_membership_roles WHERE membership_id = ? AND role = ?")
				.bind(id.to_string())
				.bind(role)
				.execute(&mut *tx)
				.await?;
		}
		tx.commit().await?;
		Ok(true)
	}

	/// Replace the full role set of a membership.
	#[tracing::instrument(skip(self, roles), fields(membership_id = %id))]
	pub async fn replace_membership_roles(
		&self,
		id: &MembershipId,
		roles: &RoleSet,
	) -> Result<bool, DbError> {
		let mut tx = self.pool.begin().await?;
		if !membership_exists(&mut tx, id).await? {
			return Ok(false);
		}
		sqlx::query("DELETE FROM tenant_membership_roles WHERE membership_id = ?")
			.bind(id.to_string())
			.execute(&mut *tx)
			.await?;
		insert_roles(&mut tx, id, roles).await?;
		tx.commit().await?;
		Ok(true)
	}

	/// Delete a membership and any pending invitation to the member's email
	/// within the same tenant.
	///
	/// # Returns
	/// `false` if the membership does not exist.
	#[tracing::instrument(skip(self), fields(membership_id = %id))]
	pub async fn delete_membership(&self, id: &MembershipId) -> Result<bool, DbError> {
		let mut tx = self.pool.begin().await?;

		let row = sqlx::query(
			r#"
			SELECT m.tenant_id, u.email
			FROM tenant_memberships m
			JOIN users u ON u.id = m.user_id
			WHERE m.id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&mut *tx)
		.await?;

		let Some(row) = row else {
			return Ok(false);
		};
		let tenant_id: String = row.get("tenant_id");
		let email: String = row.get("email");

		let revoked = sqlx::query("DELETE FROM tenant_invitations WHERE tenant_id = ? AND email = ?")
			.bind(&tenant_id)
			.bind(&email)
			.execute(&mut *tx)
			.await?;
		sqlx::query("DELETE FROM tenant_membership_roles WHERE membership_id = ?")
			.bind(id.to_string())
			.execute(&mut *tx)
			.await?;
		sqlx::query("DELETE FROM tenant_memberships WHERE id = ?")
			.bind(id.to_string())
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;
		tracing::debug!(
			membership_id = %id,
			tenant_id = %tenant_id,
			revoked_invitations = revoked.rows_affected(),
			"membership deleted"
		);
		Ok(true)
	}

	// =========================================================================
	// Invitations
	// =========================================================================

	/// Create a pending invitation.
	///
	/// # Errors
	/// - `DbError::Conflict` if an invitation to this email is already pending
	/// - `DbError::NotFound` if the tenant does not exist
	#[tracing::instrument(skip(self, invitation), fields(tenant_id = %invitation.tenant_id, invitation_id = %invitation.id))]
	pub async fn create_invitation(&self, invitation: &Invitation) -> Result<(), DbError> {
		let roles = serde_json::to_string(&invitation.roles)?;
		sqlx::query(
			r#"
			INSERT INTO tenant_invitations (id, tenant_id, email, roles, invited_by, created_at, expires_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(invitation.id.to_string())
		.bind(invitation.tenant_id.to_string())
		.bind(&invitation.email)
		.bind(roles)
		.bind(invitation.invited_by.map(|id| id.to_string()))
		.bind(format_timestamp(invitation.created_at))
		.bind(invitation.expires_at.map(format_timestamp))
		.execute(&self.pool)
		.await
		.map_err(|e| DbError::from_write(e, "an invitation to this email is already pending"))?;

		tracing::debug!(invitation_id = %invitation.id, "invitation created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(invitation_id = %id))]
	pub async fn get_invitation_by_id(&self, id: &InvitationId) -> Result<Option<Invitation>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, tenant_id, email, roles, invited_by, created_at, expires_at
			FROM tenant_invitations
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| self.row_to_invitation(&r)).transpose()
	}

	/// List pending invitations of a tenant in creation order.
	#[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
	pub async fn list_invitations_for_tenant(
		&self,
		tenant_id: &TenantId,
		offset: i64,
		limit: i64,
	) -> Result<(Vec<Invitation>, i64), DbError> {
		let total: i64 =
			sqlx::query_scalar("SELECT COUNT(*) FROM tenant_invitations WHERE tenant_id = ?")
				.bind(tenant_id.to_string())
				.fetch_one(&self.pool)
				.await?;

		let rows = sqlx::query(
			r#"
			SELECT id, tenant_id, email, roles, invited_by, created_at, expires_at
			FROM tenant_invitations
			WHERE tenant_id = ?
			ORDER BY created_at ASC, id ASC
			LIMIT ? OFFSET ?
			"#,
		)
		.bind(tenant_id.to_string())
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		let invitations = rows
			.iter()
			.map(|r| self.row_to_invitation(r))
			.collect::<Result<Vec<_>, _>>()?;
		Ok((invitations, total))
	}

	/// List pending invitations addressed to an email across all tenants.
	#[tracing::instrument(skip(self))]
	pub async fn list_invitations_for_email(&self, email: &str) -> Result<Vec<Invitation>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, tenant_id, email, roles, invited_by, created_at, expires_at
			FROM tenant_invitations
			WHERE email = ?
			ORDER BY created_at ASC, id ASC
			"#,
		)
		.bind(email)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(|r| self.row_to_invitation(r)).collect()
	}

	#[tracing::instrument(skip(self), fields(invitation_id = %id))]
	pub async fn delete_invitation(&self, id: &InvitationId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM tenant_invitations WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	/// Convert a pending invitation into a membership for `user_id`.
	///
	/// If the user is already a member the invitation's roles are merged into
	/// the existing membership. The invitation row is removed either way.
	///
	/// # Returns
	/// The resulting membership, or `None` if the invitation is not pending.
	#[tracing::instrument(skip(self), fields(invitation_id = %id, user_id = %user_id))]
	pub async fn accept_invitation(
		&self,
		id: &InvitationId,
		user_id: &UserId,
	) -> Result<Option<Membership>, DbError> {
		let mut tx = self.pool.begin().await?;

		let row = sqlx::query(
			r#"
			SELECT id, tenant_id, email, roles, invited_by, created_at, expires_at
			FROM tenant_invitations
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&mut *tx)
		.await?;
		let Some(row) = row else {
			return Ok(None);
		};
		let invitation = self.row_to_invitation(&row)?;

		let existing: Option<String> = sqlx::query_scalar(
			"SELECT id FROM tenant_memberships WHERE tenant_id = ? AND user_id = ?",
		)
		.bind(invitation.tenant_id.to_string())
		.bind(user_id.to_string())
		.fetch_optional(&mut *tx)
		.await?;

		let membership_id = match existing {
			Some(existing) => {
				let id = parse_membership_id(&existing)?;
				insert_roles(&mut tx, &id, &invitation.roles).await?;
				id
			}
			None => {
				let membership = Membership::new(invitation.tenant_id, *user_id, invitation.roles.clone());
				insert_membership(&mut tx, &membership).await?;
				membership.id
			}
		};

		sqlx::query("DELETE FROM tenant_invitations WHERE id = ?")
			.bind(id.to_string())
			.execute(&mut *tx)
			.await?;

		let row = sqlx::query(
			r#"
			SELECT id, tenant_id, user_id, provisioned_by, created_at
			FROM tenant_memberships
			WHERE id = ?
			"#,
		)
		.bind(membership_id.to_string())
		.fetch_one(&mut *tx)
		.await?;
		let mut membership = self.row_to_membership(&row)?;
		membership.roles = fetch_roles(&mut *tx, &membership_id).await?;

		tx.commit().await?;
		tracing::debug!(membership_id = %membership.id, "invitation accepted");
		Ok(Some(membership))
	}

	/// Remove invitations that expired before `now`.
	#[tracing::instrument(skip(self))]
	pub async fn delete_expired_invitations(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
		let result = sqlx::query(
			"DELETE FROM tenant_invitations WHERE expires_at IS NOT NULL AND expires_at < ?",
		)
		.bind(format_timestamp(now))
		.execute(&self.pool)
		.await?;

		if result.rows_affected() > 0 {
			tracing::debug!(count = result.rows_affected(), "expired invitations purged");
		}
		Ok(result.rows_affected())
	}

	// =========================================================================
	// Row mapping
	// =========================================================================

	async fn load_tenant(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Tenant, DbError> {
		let mut tenant = self.row_to_tenant(row)?;
		let rows = sqlx::query(
			r#"
			SELECT name, value, long_value
			FROM tenant_attributes
			WHERE tenant_id = ?
			ORDER BY name ASC, position ASC
			"#,
		)
		.bind(tenant.id.to_string())
		.fetch_all(&self.pool)
		.await?;

		let mut attributes: BTreeMap<String, Vec<String>> = BTreeMap::new();
		for row in &rows {
			let name: String = row.get("name");
			attributes.entry(name).or_default().push(attribute_value(row)?);
		}
		tenant.attributes = attributes;
		Ok(tenant)
	}

	async fn load_membership(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Membership, DbError> {
		let mut membership = self.row_to_membership(row)?;
		membership.roles = fetch_roles(&self.pool, &membership.id).await?;
		Ok(membership)
	}

	fn row_to_tenant(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Tenant, DbError> {
		let id_str: String = row.get("id");
		let created_at: String = row.get("created_at");
		let updated_at: String = row.get("updated_at");

		let id = Uuid::parse_str(&id_str)
			.map_err(|e| DbError::Internal(format!("Invalid tenant ID: {e}")))?;

		Ok(Tenant {
			id: TenantId::new(id),
			realm: row.get("realm"),
			name: row.get("name"),
			attributes: BTreeMap::new(),
			created_at: parse_timestamp(&created_at, "created_at")?,
			updated_at: parse_timestamp(&updated_at, "updated_at")?,
		})
	}

	fn row_to_membership(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Membership, DbError> {
		let id_str: String = row.get("id");
		let tenant_id_str: String = row.get("tenant_id");
		let user_id_str: String = row.get("user_id");
		let created_at: String = row.get("created_at");

		let tenant_id = Uuid::parse_str(&tenant_id_str)
			.map_err(|e| DbError::Internal(format!("Invalid tenant_id: {e}")))?;
		let user_id = Uuid::parse_str(&user_id_str)
			.map_err(|e| DbError::Internal(format!("Invalid user_id: {e}")))?;

		Ok(Membership {
			id: parse_membership_id(&id_str)?,
			tenant_id: TenantId::new(tenant_id),
			user_id: UserId::new(user_id),
			roles: RoleSet::new(),
			provisioned_by: row.get("provisioned_by"),
			created_at: parse_timestamp(&created_at, "created_at")?,
		})
	}

	fn row_to_invitation(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Invitation, DbError> {
		let id_str: String = row.get("id");
		let tenant_id_str: String = row.get("tenant_id");
		let roles: String = row.get("roles");
		let invited_by: Option<String> = row.get("invited_by");
		let created_at: String = row.get("created_at");
		let expires_at: Option<String> = row.get("expires_at");

		let id = Uuid::parse_str(&id_str)
			.map_err(|e| DbError::Internal(format!("Invalid invitation ID: {e}")))?;
		let tenant_id = Uuid::parse_str(&tenant_id_str)
			.map_err(|e| DbError::Internal(format!("Invalid tenant_id: {e}")))?;
		let invited_by = invited_by
			.map(|s| {
				Uuid::parse_str(&s)
					.map(UserId::new)
					.map_err(|e| DbError::Internal(format!("Invalid invited_by: {e}")))
			})
			.transpose()?;

		Ok(Invitation {
			id: InvitationId::new(id),
			tenant_id: TenantId::new(tenant_id),
			email: row.get("email"),
			roles: serde_json::from_str(&roles)?,
			invited_by,
			created_at: parse_timestamp(&created_at, "created_at")?,
			expires_at: expires_at
				.map(|s| parse_timestamp(&s, "expires_at"))
				.transpose()?,
		})
	}
}

// =============================================================================
// Transaction helpers
// =============================================================================

type Tx<'a> = sqlx::Transaction<'a, Sqlite>;

async fn insert_membership(tx: &mut Tx<'_>, membership: &Membership) -> Result<(), DbError> {
	sqlx::query(
		r#"
		INSERT INTO tenant_memberships (id, tenant_id, user_id, provisioned_by, created_at)
		VALUES (?, ?, ?, ?, ?)
		"#,
	)
	.bind(membership.id.to_string())
	.bind(membership.tenant_id.to_string())
	.bind(membership.user_id.to_string())
	.bind(&membership.provisioned_by)
	.bind(format_timestamp(membership.created_at))
	.execute(&mut **tx)
	.await
	.map_err(|e| DbError::from_write(e, "user is already a member of this tenant"))?;

	insert_roles(tx, &membership.id, &membership.roles).await
}

async fn insert_roles(tx: &mut Tx<'_>, id: &MembershipId, roles: &RoleSet) -> Result<(), DbError> {
	for role in roles {
		sqlx::query("INSERT OR IGNORE INTO tenant_membership_roles (membership_id, role) VALUES (?, ?)")
			.bind(id.to_string())
			.bind(role)
			.execute(&mut **tx)
			.await?;
	}
	Ok(())
}

async fn membership_exists(tx: &mut Tx<'_>, id: &MembershipId) -> Result<bool, DbError> {
	let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM tenant_memberships WHERE id = ?")
		.bind(id.to_string())
		.fetch_optional(&mut **tx)
		.await?;
	Ok(found.is_some())
}

async fn insert_attribute_values(
	tx: &mut Tx<'_>,
	tenant_id: &TenantId,
	key: &str,
	values: &[String],
) -> Result<(), DbError> {
	for (position, value) in values.iter().enumerate() {
		let (inline, long, hash) = if is_long_value(value) {
			(None, Some(value.as_str()), Some(hash_value(value)))
		} else {
			(Some(value.as_str()), None, None)
		};
		sqlx::query(
			r#"
			INSERT INTO tenant_attributes (tenant_id, name, position, value, long_value, long_value_hash)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(tenant_id.to_string())
		.bind(key)
		.bind(position as i64)
		.bind(inline)
		.bind(long)
		.bind(hash)
		.execute(&mut **tx)
		.await
		.map_err(|e| DbError::from_write(e, "duplicate attribute position"))?;
	}
	Ok(())
}

async fn fetch_roles<'e, E>(executor: E, id: &MembershipId) -> Result<RoleSet, DbError>
where
	E: sqlx::Executor<'e, Database = Sqlite>,
{
	let roles: Vec<String> = sqlx::query_scalar(
		"SELECT role FROM tenant_membership_roles WHERE membership_id = ? ORDER BY role ASC",
	)
	.bind(id.to_string())
	.fetch_all(executor)
	.await?;
	Ok(roles.into_iter().collect())
}

fn parse_membership_id(raw: &str) -> Result<MembershipId, DbError> {
	Uuid::parse_str(raw)
		.map(MembershipId::new)
		.map_err(|e| DbError::Internal(format!("Invalid membership ID: {e}")))
}

fn attribute_value(row: &sqlx::sqlite::SqliteRow) -> Result<String, DbError> {
	let value: Option<String> = row.get("value");
	let long_value: Option<String> = row.get("long_value");
	value
		.or(long_value)
		.ok_or_else(|| DbError::Internal("attribute row has no value".to_string()))
}

fn is_long_value(value: &str) -> bool {
	value.chars().count() > LONG_VALUE_THRESHOLD
}

fn hash_value(value: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(value.as_bytes());
	hex::encode(hasher.finalize())
}

/// Case folding shared by the stored `name_lower` column and search patterns.
/// SQLite's `LOWER` only folds ASCII.
fn fold_case(value: &str) -> String {
	value.to_lowercase()
}

fn like_pattern(search: &str) -> String {
	let escaped = fold_case(search)
		.replace('\\', "\\\\")
		.replace('%', "\\%")
		.replace('_', "\\_");
	format!("%{escaped}%")
}

#[async_trait]
impl TenantStore for TenantRepository {
	async fn create_tenant(&self, tenant: &Tenant, admin: &Membership) -> Result<(), DbError> {
		self.create_tenant(tenant, admin).await
	}

	async fn get_tenant_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DbError> {
		self.get_tenant_by_id(id).await
	}

	async fn rename_tenant(&self, id: &TenantId, name: &str) -> Result<bool, DbError> {
		self.rename_tenant(id, name).await
	}

	async fn delete_tenant(&self, id: &TenantId) -> Result<bool, DbError> {
		self.delete_tenant(id).await
	}

	async fn list_tenants(
		&self,
		realm: &str,
		query: &TenantQuery,
	) -> Result<(Vec<Tenant>, i64), DbError> {
		self.list_tenants(realm, query).await
	}

	async fn get_attribute(&self, tenant_id: &TenantId, key: &str) -> Result<Vec<String>, DbError> {
		self.get_attribute(tenant_id, key).await
	}

	async fn set_attribute(
		&self,
		tenant_id: &TenantId,
		key: &str,
		values: &[String],
	) -> Result<(), DbError> {
		self.set_attribute(tenant_id, key, values).await
	}

	async fn remove_attribute(&self, tenant_id: &TenantId, key: &str) -> Result<bool, DbError> {
		self.remove_attribute(tenant_id, key).await
	}

	async fn create_membership(&self, membership: &Membership) -> Result<(), DbError> {
		self.create_membership(membership).await
	}

	async fn get_membership_by_id(&self, id: &MembershipId) -> Result<Option<Membership>, DbError> {
		self.get_membership_by_id(id).await
	}

	async fn get_membership(
		&self,
		tenant_id: &TenantId,
		user_id: &UserId,
	) -> Result<Option<Membership>, DbError> {
		self.get_membership(tenant_id, user_id).await
	}

	async fn list_memberships_for_tenant(
		&self,
		tenant_id: &TenantId,
		offset: i64,
		limit: i64,
	) -> Result<(Vec<Membership>, i64), DbError> {
		self.list_memberships_for_tenant(tenant_id, offset, limit).await
	}

	async fn list_memberships_for_user(&self, user_id: &UserId) -> Result<Vec<Membership>, DbError> {
		self.list_memberships_for_user(user_id).await
	}

	async fn add_membership_roles(&self, id: &MembershipId, roles: &RoleSet) -> Result<bool, DbError> {
		self.add_membership_roles(id, roles).await
	}

	async fn remove_membership_roles(
		&self,
		id: &MembershipId,
		roles: &RoleSet,
	) -> Result<bool, DbError> {
		self.remove_membership_roles(id, roles).await
	}

	async fn replace_membership_roles(
		&self,
		id: &MembershipId,
		roles: &RoleSet,
	) -> Result<bool, DbError> {
		self.replace_membership_roles(id, roles).await
	}

	async fn delete_membership(&self, id: &MembershipId) -> Result<bool, DbError> {
		self.delete_membership(id).await
	}

	async fn create_invitation(&self, invitation: &Invitation) -> Result<(), DbError> {
		self.create_invitation(invitation).await
	}

	async fn get_invitation_by_id(&self, id: &InvitationId) -> Result<Option<Invitation>, DbError> {
		self.get_invitation_by_id(id).await
	}

	async fn list_invitations_for_tenant(
		&self,
		tenant_id: &TenantId,
		offset: i64,
		limit: i64,
	) -> Result<(Vec<Invitation>, i64), DbError> {
		self.list_invitations_for_tenant(tenant_id, offset, limit).await
	}

	async fn list_invitations_for_email(&self, email: &str) -> Result<Vec<Invitation>, DbError> {
		self.list_invitations_for_email(email).await
	}

	async fn delete_invitation(&self, id: &InvitationId) -> Result<bool, DbError> {
		self.delete_invitation(id).await
	}

	async fn accept_invitation(
		&self,
		id: &InvitationId,
		user_id: &UserId,
	) -> Result<Option<Membership>, DbError> {
		self.accept_invitation(id, user_id).await
	}

	async fn delete_expired_invitations(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
		self.delete_expired_invitations(now).await
	}
}
