// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use tenancy_server_auth::TenancyError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl DbError {
	/// Translate constraint violations on a write into domain errors.
	///
	/// Unique violations become `Conflict(what)`, foreign key violations become
	/// `NotFound`. Anything else stays a raw database error.
	pub fn from_write(e: sqlx::Error, what: &str) -> Self {
		match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				DbError::Conflict(what.to_string())
			}
			sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
				DbError::NotFound("referenced tenant or user does not exist".to_string())
			}
			_ => DbError::Sqlx(e),
		}
	}
}

impl From<DbError> for TenancyError {
	fn from(e: DbError) -> Self {
		match e {
			DbError::NotFound(msg) => TenancyError::NotFound(msg),
			DbError::Conflict(msg) => TenancyError::Conflict(msg),
			DbError::Sqlx(e) => TenancyError::Internal(format!("database error: {e}")),
			DbError::Internal(msg) => TenancyError::Internal(msg),
			DbError::Serialization(e) => TenancyError::Internal(format!("serialization error: {e}")),
		}
	}
}

pub type Result<T> = std::result::Result<T, DbError>;
