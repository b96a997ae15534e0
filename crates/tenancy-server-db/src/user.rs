// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User repository for the directory mirror of identity-host subjects.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqlitePool, Row};
use tenancy_server_auth::{User, UserId};
use uuid::Uuid;

use crate::error::DbError;
use crate::timestamp::{format_timestamp, parse_timestamp};

#[async_trait]
pub trait UserStore: Send + Sync {
	async fn upsert_user(&self, user: &User) -> Result<User, DbError>;
	async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError>;
	async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;
	async fn set_realm_admin(&self, id: &UserId, is_realm_admin: bool) -> Result<bool, DbError>;
}

/// Repository for user database operations.
///
/// Users are keyed by lower-cased email. The identity host is the source of
/// truth; this table only mirrors what the tenant directory needs.
#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

impl UserRepository {
	/// Create a new repository with the given pool.
	///
	/// # Arguments
	/// * `pool` - SQLite connection pool
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a user or refresh the mirrored fields of an existing one.
	///
	/// The email is the upsert key; on conflict the stored id, creation time
	/// and realm-admin flag are kept.
	///
	/// # Returns
	/// The stored user, which may carry a different id than `user`.
	#[tracing::instrument(skip(self, user), fields(email = %user.email))]
	pub async fn upsert_user(&self, user: &User) -> Result<User, DbError> {
		let now = format_timestamp(Utc::now());
		sqlx::query(
			r#"
			INSERT INTO users (id, email, email_verified, display_name, is_realm_admin, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT(email) DO UPDATE SET
				email_verified = excluded.email_verified,
				display_name = COALESCE(excluded.display_name, users.display_name),
				updated_at = excluded.updated_at
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.email)
		.bind(user.email_verified as i32)
		.bind(&user.display_name)
		.bind(user.is_realm_admin as i32)
		.bind(format_timestamp(user.created_at))
		.bind(&now)
		.execute(&self.pool)
		.await?;

		let stored = self
			.get_user_by_email(&user.email)
			.await?
			.ok_or_else(|| DbError::Internal("upserted user vanished".to_string()))?;

		tracing::debug!(user_id = %stored.id, "user upserted");
		Ok(stored)
	}

	/// Get a user by ID.
	///
	/// # Returns
	/// `None` if no user exists with this ID.
	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, email, email_verified, display_name, is_realm_admin, created_at, updated_at
			FROM users
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| self.row_to_user(&r)).transpose()
	}

	/// Get a user by (lower-cased) email.
	#[tracing::instrument(skip(self))]
	pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, email, email_verified, display_name, is_realm_admin, created_at, updated_at
			FROM users
			WHERE email = ?
			"#,
		)
		.bind(email)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| self.row_to_user(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn set_realm_admin(&self, id: &UserId, is_realm_admin: bool) -> Result<bool, DbError> {
		let result = sqlx::query("UPDATE users SET is_realm_admin = ?, updated_at = ? WHERE id = ?")
			.bind(is_realm_admin as i32)
			.bind(format_timestamp(Utc::now()))
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	fn row_to_user(&self, row: &sqlx::sqlite::SqliteRow) -> Result<User, DbError> {
		let id_str: String = row.get("id");
		let email_verified: i32 = row.get("email_verified");
		let is_realm_admin: i32 = row.get("is_realm_admin");
		let created_at: String = row.get("created_at");
		let updated_at: String = row.get("updated_at");

		let id =
			Uuid::parse_str(&id_str).map_err(|e| DbError::Internal(format!("Invalid user ID: {e}")))?;

		Ok(User {
			id: UserId::new(id),
			email: row.get("email"),
			email_verified: email_verified != 0,
			display_name: row.get("display_name"),
			is_realm_admin: is_realm_admin != 0,
			created_at: parse_timestamp(&created_at, "created_at")?,
			updated_at: parse_timestamp(&updated_at, "updated_at")?,
		})
	}
}

#[async_trait]
impl UserStore for UserRepository {
	async fn upsert_user(&self, user: &User) -> Result<User, DbError> {
		self.upsert_user(user).await
	}

	async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError> {
		self.get_user_by_id(id).await
	}

	async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		self.get_user_by_email(email).await
	}

	async fn set_realm_admin(&self, id: &UserId, is_realm_admin: bool) -> Result<bool, DbError> {
		self.set_realm_admin(id, is_realm_admin).await
	}
}
