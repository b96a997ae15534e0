// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared application state and router assembly.

use axum::{
	middleware,
	routing::{delete, get, patch, post, put},
	Router,
};
use chrono::Duration;
use sqlx::SqlitePool;
use std::sync::Arc;
use tenancy_server_auth::{InMemorySessionHost, Notifier, SessionHost};
use tenancy_server_config::{SecretString, ServerConfig};
use tenancy_server_db::{TenantRepository, UserRepository, UserStore};
use tenancy_server_tenants::{
	ClaimProjector, InvitationLifecycle, ScopedProvisioning, TenantDirectory, TenantResolver,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_docs::ApiDoc;
use crate::auth_middleware::auth_layer;
use crate::routes;
use crate::tokens::TokenRegistry;

/// Authentication settings the handlers need at request time.
#[derive(Debug, Clone)]
pub struct AuthSettings {
	pub dev_mode: bool,
	pub host_secret: Option<SecretString>,
	pub token_ttl: Duration,
}

#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub directory: TenantDirectory,
	pub lifecycle: InvitationLifecycle,
	pub resolver: TenantResolver,
	pub provisioning: ScopedProvisioning,
	pub claims: ClaimProjector,
	pub users: Arc<dyn UserStore>,
	pub sessions: Arc<InMemorySessionHost>,
	pub tokens: Arc<TokenRegistry>,
	pub auth: AuthSettings,
}

/// Wire the directory services over `pool`.
pub fn create_app_state(
	pool: SqlitePool,
	config: &ServerConfig,
	notifier: Arc<dyn Notifier>,
) -> AppState {
	let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(pool.clone()));
	let tenants = Arc::new(TenantRepository::new(pool.clone()));
	let invitation_ttl = config
		.invitations
		.expiry_days
		.map(|days| Duration::days(i64::from(days)));

	let directory = TenantDirectory::new(tenants, users.clone(), config.auth.realm.clone())
		.with_notifier(notifier)
		.with_invitation_ttl(invitation_ttl);
	let lifecycle = InvitationLifecycle::new(directory.clone());
	let sessions = Arc::new(InMemorySessionHost::new());
	let scopes = Arc::new(config.identity_providers.clone());
	let session_host: Arc<dyn SessionHost> = sessions.clone();

	let resolver = TenantResolver::new(
		directory.clone(),
		lifecycle.clone(),
		session_host,
		scopes.clone(),
	);
	let provisioning = ScopedProvisioning::new(directory.clone(), scopes);
	let claims = ClaimProjector::new(directory.clone());

	AppState {
		pool,
		directory,
		lifecycle,
		resolver,
		provisioning,
		claims,
		users,
		sessions,
		tokens: Arc::new(TokenRegistry::new()),
		auth: AuthSettings {
			dev_mode: config.auth.dev_mode,
			host_secret: config.auth.host_secret.clone(),
			token_ttl: Duration::seconds(i64::try_from(config.auth.token_ttl_secs).unwrap_or(i64::MAX)),
		},
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route(
			"/tenants",
			post(routes::tenants::create_tenant).get(routes::tenants::list_tenants),
		)
		.route(
			"/tenants/{id}",
			get(routes::tenants::get_tenant)
				.patch(routes::tenants::update_tenant)
				.delete(routes::tenants::delete_tenant),
		)
		.route(
			"/tenants/{id}/attributes",
			get(routes::attributes::list_attributes),
		)
		.route(
			"/tenants/{id}/attributes/{key}",
			put(routes::attributes::set_attribute).delete(routes::attributes::remove_attribute),
		)
		.route(
			"/tenants/{id}/memberships",
			get(routes::memberships::list_memberships),
		)
		.route(
			"/tenants/{id}/memberships/{mid}",
			delete(routes::memberships::revoke_membership),
		)
		.route(
			"/tenants/{id}/memberships/{mid}/roles",
			patch(routes::memberships::replace_roles),
		)
		.route(
			"/tenants/{id}/memberships/{mid}/roles/grant",
			patch(routes::memberships::grant_roles),
		)
		.route(
			"/tenants/{id}/memberships/{mid}/roles/revoke",
			patch(routes::memberships::revoke_roles),
		)
		.route(
			"/tenants/{id}/invitations",
			post(routes::invitations::create_invitation).get(routes::invitations::list_invitations),
		)
		.route(
			"/tenants/{id}/invitations/{iid}",
			delete(routes::invitations::revoke_invitation),
		)
		.route("/switch", put(routes::switch::switch_tenant))
		.route("/login/tenant", get(routes::login::login_state))
		.route("/login/tenant/create", post(routes::login::submit_new_tenant))
		.route(
			"/login/tenant/invitations",
			post(routes::login::submit_invitation_review),
		)
		.route("/login/tenant/select", post(routes::login::submit_selection))
		.route("/login/token", post(routes::login::issue_token))
		.route("/auth/sessions", post(routes::sessions::create_auth_session))
		.merge(SwaggerUi::new("/api").url("/api/openapi.json", ApiDoc::openapi()))
		.layer(middleware::from_fn_with_state(state.clone(), auth_layer))
		.with_state(state)
}
