// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error responses for HTTP handlers.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use tenancy_server_api::ErrorResponse;
use tenancy_server_auth::TenancyError;
use tenancy_server_db::DbError;

/// A [`TenancyError`] rendered as `{error, message}` with its HTTP status.
#[derive(Debug)]
pub struct ApiError(pub TenancyError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<TenancyError> for ApiError {
	fn from(e: TenancyError) -> Self {
		Self(e)
	}
}

impl From<DbError> for ApiError {
	fn from(e: DbError) -> Self {
		Self(e.into())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status =
			StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		if self.0.is_internal() {
			tracing::error!(error = %self.0, "request failed");
		} else {
			tracing::debug!(error = %self.0, status = status.as_u16(), "request rejected");
		}
		(
			status,
			Json(ErrorResponse {
				error: self.0.error_code().to_string(),
				message: self.0.public_message(),
			}),
		)
			.into_response()
	}
}

pub fn forbidden(message: impl Into<String>) -> ApiError {
	ApiError(TenancyError::Forbidden(message.into()))
}

pub fn not_found(message: impl Into<String>) -> ApiError {
	ApiError(TenancyError::NotFound(message.into()))
}
