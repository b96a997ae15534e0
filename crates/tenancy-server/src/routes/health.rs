// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tenancy_server_api::HealthResponse;

use crate::api::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server and database are healthy", body = HealthResponse),
        (status = 503, description = "Database unavailable", body = HealthResponse)
    ),
    tag = "health"
)]
#[tracing::instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let database = sqlx::query("SELECT 1").execute(&state.pool).await;
	let (status, db_status) = match database {
		Ok(_) => (StatusCode::OK, "healthy"),
		Err(e) => {
			tracing::error!(error = %e, "database health check failed");
			(StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
		}
	};

	(
		status,
		Json(HealthResponse {
			status: if status.is_success() { "ok" } else { "degraded" }.to_string(),
			database: db_status.to_string(),
			version: env!("CARGO_PKG_VERSION").to_string(),
		}),
	)
}
