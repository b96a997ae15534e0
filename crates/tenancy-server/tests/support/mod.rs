// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use axum::{
	body::Body,
	http::{header, Method, Request, StatusCode},
	Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tenancy_server::{create_app_state, create_router, AppState, ServerConfig};
use tenancy_server_auth::{IdentityProviderScopes, LogNotifier};
use tenancy_server_config::SecretString;
use tower::ServiceExt;

pub const HOST_SECRET: &str = "test-host-secret";

pub struct TestApp {
	pub router: Router,
	pub state: AppState,
	pub pool: sqlx::SqlitePool,
	_dir: TempDir,
}

/// Result of a session hand-off.
pub struct TestLogin {
	pub token: String,
	pub user_id: String,
	pub user_session_id: String,
}

pub fn test_config() -> ServerConfig {
	let mut config = ServerConfig::default();
	config.auth.dev_mode = false;
	config.auth.host_secret = Some(SecretString::new(HOST_SECRET));
	config
}

impl TestApp {
	pub async fn new() -> Self {
		Self::with_config(test_config()).await
	}

	/// App over a fresh file database in a temp dir.
	pub async fn with_config(config: ServerConfig) -> Self {
		let dir = tempfile::tempdir().unwrap();
		let db_url = format!("sqlite:{}", dir.path().join("tenancy.db").display());
		let pool = tenancy_server_db::create_pool(&db_url).await.unwrap();
		tenancy_server_db::run_migrations(&pool).await.unwrap();
		let state = create_app_state(pool.clone(), &config, Arc::new(LogNotifier));
		Self {
			router: create_router(state.clone()),
			state,
			pool,
			_dir: dir,
		}
	}

	/// Same database, new identity-provider scopes. Sessions start empty.
	pub fn with_scopes(self, scopes: &[(&str, &str)]) -> Self {
		let mut config = test_config();
		config.identity_providers = IdentityProviderScopes::from_raw(scopes.iter().copied()).unwrap();
		let state = create_app_state(self.pool.clone(), &config, Arc::new(LogNotifier));
		Self {
			router: create_router(state.clone()),
			state,
			pool: self.pool,
			_dir: self._dir,
		}
	}

	pub async fn send(
		&self,
		method: Method,
		uri: &str,
		token: Option<&str>,
		body: Option<Value>,
	) -> (StatusCode, Value) {
		let mut builder = Request::builder().method(method).uri(uri);
		if let Some(token) = token {
			builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
		}
		let request = match body {
			Some(body) => builder
				.header(header::CONTENT_TYPE, "application/json")
				.body(Body::from(body.to_string()))
				.unwrap(),
			None => builder.body(Body::empty()).unwrap(),
		};
		self.dispatch(request).await
	}

	pub async fn send_form(&self, uri: &str, token: &str, form: &str) -> (StatusCode, Value) {
		let request = Request::builder()
			.method(Method::POST)
			.uri(uri)
			.header(header::AUTHORIZATION, format!("Bearer {token}"))
			.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
			.body(Body::from(form.to_string()))
			.unwrap();
		self.dispatch(request).await
	}

	async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
		let response = self.router.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		let value = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap_or(Value::Null)
		};
		(status, value)
	}

	pub async fn hand_off(&self, payload: Value) -> (StatusCode, Value) {
		let request = Request::builder()
			.method(Method::POST)
			.uri("/auth/sessions")
			.header(header::CONTENT_TYPE, "application/json")
			.header("x-host-secret", HOST_SECRET)
			.body(Body::from(payload.to_string()))
			.unwrap();
		self.dispatch(request).await
	}

	/// Register a verified subject and open an authentication session.
	pub async fn login(&self, email: &str) -> TestLogin {
		self.login_with(json!({ "email": email, "email_verified": true }))
			.await
	}

	pub async fn login_with(&self, payload: Value) -> TestLogin {
		let (status, body) = self.hand_off(payload).await;
		assert_eq!(status, StatusCode::CREATED, "hand-off failed: {body}");
		TestLogin {
			token: body["session_token"].as_str().unwrap().to_string(),
			user_id: body["user_id"].as_str().unwrap().to_string(),
			user_session_id: body["user_session_id"].as_str().unwrap().to_string(),
		}
	}

	/// Create a tenant through the API and return its id.
	pub async fn create_tenant(&self, token: &str, name: &str) -> String {
		let (status, body) = self
			.send(Method::POST, "/tenants", Some(token), Some(json!({ "name": name })))
			.await;
		assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
		body["id"].as_str().unwrap().to_string()
	}

	pub async fn invite(&self, token: &str, tenant_id: &str, email: &str) -> Value {
		let (status, body) = self
			.send(
				Method::POST,
				&format!("/tenants/{tenant_id}/invitations"),
				Some(token),
				Some(json!({ "email": email })),
			)
			.await;
		assert_eq!(status, StatusCode::CREATED, "invite failed: {body}");
		body
	}
}
