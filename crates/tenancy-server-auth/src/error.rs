// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error taxonomy shared by the tenant directory and the login flow.

use thiserror::Error;

/// Errors surfaced by tenant directory operations and tenant resolution.
#[derive(Debug, Error)]
pub enum TenancyError {
	// =========================================================================
	// Caller errors
	// =========================================================================
	/// Blank or malformed input. The caller may correct it and retry.
	#[error("validation failed: {0}")]
	Validation(String),

	/// Duplicate tenant name, membership or invitation.
	#[error("conflict: {0}")]
	Conflict(String),

	/// Unknown id.
	#[error("not found: {0}")]
	NotFound(String),

	// =========================================================================
	// Authorization errors
	// =========================================================================
	/// No authenticated subject was presented.
	#[error("authentication required")]
	Unauthenticated,

	/// The caller lacks tenant-admin or member standing for the operation.
	#[error("forbidden: {0}")]
	Forbidden(String),

	/// The login cannot resolve into any tenant. Fatal to the login.
	#[error("access denied: {0}")]
	AccessDenied(String),

	// =========================================================================
	// Server errors
	// =========================================================================
	#[error("internal error: {0}")]
	Internal(String),
}

impl TenancyError {
	/// Returns true if this error should be logged at error level.
	pub fn is_internal(&self) -> bool {
		matches!(self, TenancyError::Internal(_))
	}

	/// Returns true if this error ends the current login instead of re-prompting.
	pub fn is_fatal_to_login(&self) -> bool {
		matches!(
			self,
			TenancyError::AccessDenied(_) | TenancyError::Unauthenticated | TenancyError::Internal(_)
		)
	}

	/// Returns the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			TenancyError::Validation(_) => 400,
			TenancyError::Unauthenticated => 401,
			TenancyError::Forbidden(_) | TenancyError::AccessDenied(_) => 403,
			TenancyError::NotFound(_) => 404,
			TenancyError::Conflict(_) => 409,
			TenancyError::Internal(_) => 500,
		}
	}

	/// Machine-readable error code used in HTTP error bodies.
	pub fn error_code(&self) -> &'static str {
		match self {
			TenancyError::Validation(_) => "validation_error",
			TenancyError::Unauthenticated => "unauthorized",
			TenancyError::Forbidden(_) => "forbidden",
			TenancyError::AccessDenied(_) => "access_denied",
			TenancyError::NotFound(_) => "not_found",
			TenancyError::Conflict(_) => "conflict",
			TenancyError::Internal(_) => "internal_error",
		}
	}

	/// Message safe to return to a client. Internal details are never exposed.
	pub fn public_message(&self) -> String {
		match self {
			TenancyError::Internal(_) => "An internal error occurred".to_string(),
			other => other.to_string(),
		}
	}
}

pub type Result<T> = std::result::Result<T, TenancyError>;
