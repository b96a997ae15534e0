// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Integration tests for login-time tenant resolution.
//!
//! Each test drives the screens the challenge renderer would show, from the
//! identity-host hand-off to the issued access token.

mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;
use support::TestApp;
use tenancy_server_auth::{TenantId, UserId};

#[tokio::test]
async fn first_login_creates_a_tenant() {
	let app = TestApp::new().await;
	let alice = app.login("alice@example.com").await;

	let (status, body) = app
		.send(Method::GET, "/login/tenant", Some(&alice.token), None)
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "step_required");
	assert_eq!(body["required_step"], "create_tenant");

	let (status, body) = app
		.send(Method::POST, "/login/token", Some(&alice.token), None)
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "validation_error");

	let (status, body) = app
		.send_form("/login/tenant/create", &alice.token, "tenantName=%20%20")
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["required_step"], "create_tenant");
	assert!(body["error"].is_string());

	let (status, body) = app
		.send_form("/login/tenant/create", &alice.token, "tenantName=Acme")
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "resolved");
	assert_eq!(body["active_tenant"]["name"], "Acme");

	let (status, body) = app
		.send(Method::POST, "/login/token", Some(&alice.token), None)
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["token_type"], "Bearer");
	assert_eq!(body["sub"], alice.user_id);
	assert_eq!(body["active_tenant"]["tenant_name"], "Acme");
	assert_eq!(body["active_tenant"]["roles"], json!(["tenant-admin"]));
	assert_eq!(body["all_tenants"].as_array().unwrap().len(), 1);

	// The access token authenticates the REST API.
	let access = body["access_token"].as_str().unwrap();
	let (status, body) = app.send(Method::GET, "/tenants", Some(access), None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["total"], 1);

	// A tenant can only be created from the login screen once.
	let (status, _) = app
		.send_form("/login/tenant/create", &alice.token, "tenantName=Second")
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invitations_are_reviewed_before_anything_else() {
	let app = TestApp::new().await;
	let alice = app.login("alice@example.com").await;
	let acme = app.create_tenant(&alice.token, "Acme").await;
	let beta = app.create_tenant(&alice.token, "Beta").await;
	app.invite(&alice.token, &acme, "bob@example.com").await;
	app.invite(&alice.token, &beta, "bob@example.com").await;

	let bob = app.login("bob@example.com").await;
	let (_, body) = app
		.send(Method::GET, "/login/tenant", Some(&bob.token), None)
		.await;
	assert_eq!(body["required_step"], "review_invitations");
	assert_eq!(body["pending_steps"], json!(["review_invitations", "create_tenant"]));
	assert_eq!(body["invitations"].as_array().unwrap().len(), 2);

	// Without any membership at least one invitation must be accepted.
	let (status, body) = app
		.send_form(
			"/login/tenant/invitations",
			&bob.token,
			&format!("rejectedTenants={acme}"),
		)
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["required_step"], "review_invitations");

	let (status, _) = app
		.send_form("/login/tenant/invitations", &bob.token, "acceptedTenants=garbage")
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, body) = app
		.send_form(
			"/login/tenant/invitations",
			&bob.token,
			&format!("acceptedTenants={acme}&rejectedTenants={beta}"),
		)
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "resolved");
	assert_eq!(body["active_tenant"]["id"], acme);
	assert_eq!(body["review"]["accepted"], json!([acme]));
	assert_eq!(body["review"]["rejected"], json!([beta]));

	let (status, body) = app
		.send(Method::POST, "/login/token", Some(&bob.token), None)
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["active_tenant"]["roles"], json!(["tenant-user"]));

	let (_, body) = app
		.send(Method::GET, &format!("/tenants/{beta}/invitations"), Some(&alice.token), None)
		.await;
	assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn review_is_required_once_per_login_even_with_one_tenant() {
	let app = TestApp::new().await;
	let alice = app.login("alice@example.com").await;
	let acme = app.create_tenant(&alice.token, "Acme").await;
	let setup = app.login("bob@example.com").await;
	let bobco = app.create_tenant(&setup.token, "Bobco").await;
	app.invite(&alice.token, &acme, "bob@example.com").await;

	let bob = app.login("bob@example.com").await;
	for _ in 0..2 {
		let (status, body) = app
			.send(Method::GET, "/login/tenant", Some(&bob.token), None)
			.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["required_step"], "review_invitations");
		assert!(body.get("active_tenant").is_none());
	}
	let (status, _) = app
		.send(Method::POST, "/login/token", Some(&bob.token), None)
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	// Leaving the invitation unanswered completes the review.
	let (status, body) = app
		.send_form("/login/tenant/invitations", &bob.token, "")
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "resolved");
	assert_eq!(body["active_tenant"]["id"], bobco);
	assert_eq!(body["review"]["still_pending"], 1);

	let (status, body) = app
		.send(Method::POST, "/login/token", Some(&bob.token), None)
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["active_tenant"]["tenant_id"], bobco);

	let next = app.login("bob@example.com").await;
	let (_, body) = app
		.send(Method::GET, "/login/tenant", Some(&next.token), None)
		.await;
	assert_eq!(body["required_step"], "review_invitations");
}

#[tokio::test]
async fn several_tenants_require_selection() {
	let app = TestApp::new().await;
	let setup = app.login("alice@example.com").await;
	let zeta = app.create_tenant(&setup.token, "Zeta").await;
	let acme = app.create_tenant(&setup.token, "Acme").await;

	let alice = app.login("alice@example.com").await;
	let (_, body) = app
		.send(Method::GET, "/login/tenant", Some(&alice.token), None)
		.await;
	assert_eq!(body["required_step"], "select_tenant");
	assert_eq!(body["max_auth_age"], json!(i64::MAX));
	let names: Vec<&str> = body["tenants"]
		.as_array()
		.unwrap()
		.iter()
		.map(|t| t["name"].as_str().unwrap())
		.collect();
	assert_eq!(names, vec!["Acme", "Zeta"]);

	let (status, body) = app
		.send_form("/login/tenant/select", &alice.token, "tenant=")
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["required_step"], "select_tenant");

	let (status, body) = app
		.send_form("/login/tenant/select", &alice.token, &format!("tenant={zeta}"))
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["active_tenant"]["id"], zeta);

	let (_, body) = app
		.send(Method::POST, "/login/token", Some(&alice.token), None)
		.await;
	assert_eq!(body["active_tenant"]["tenant_id"], zeta);
	let all: Vec<&str> = body["all_tenants"]
		.as_array()
		.unwrap()
		.iter()
		.map(|t| t["tenant_name"].as_str().unwrap())
		.collect();
	assert_eq!(all, vec!["Acme", "Zeta"]);

	// Switching to another membership refreshes the token set.
	let access = body["access_token"].as_str().unwrap().to_string();
	let (status, body) = app
		.send(Method::PUT, "/switch", Some(&access), Some(json!({ "tenantId": acme })))
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["active_tenant"]["tenant_id"], acme);
	assert_ne!(body["access_token"], access);

	let (status, body) = app
		.send(
			Method::PUT,
			"/switch",
			Some(&access),
			Some(json!({ "tenantId": TenantId::generate().to_string() })),
		)
		.await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body["error"], "access_denied");
	let (status, _) = app.send(Method::GET, "/tenants", Some(&access), None).await;
	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_selection_ends_the_login() {
	let app = TestApp::new().await;
	let setup = app.login("alice@example.com").await;
	app.create_tenant(&setup.token, "Acme").await;
	app.create_tenant(&setup.token, "Beta").await;

	let alice = app.login("alice@example.com").await;
	let (status, body) = app
		.send_form(
			"/login/tenant/select",
			&alice.token,
			&format!("tenant={}", TenantId::generate()),
		)
		.await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body["error"], "access_denied");

	let (status, _) = app
		.send(Method::GET, "/login/tenant", Some(&alice.token), None)
		.await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sso_login_reuses_the_active_tenant() {
	let app = TestApp::new().await;
	let setup = app.login("alice@example.com").await;
	let acme = app.create_tenant(&setup.token, "Acme").await;
	app.create_tenant(&setup.token, "Beta").await;

	let first = app.login("alice@example.com").await;
	app.send_form("/login/tenant/select", &first.token, &format!("tenant={acme}"))
		.await;

	let second = app
		.login_with(json!({
			"email": "alice@example.com",
			"email_verified": true,
			"sso_session": first.user_session_id,
		}))
		.await;
	assert_eq!(second.user_session_id, first.user_session_id);

	let (_, body) = app
		.send(Method::GET, "/login/tenant", Some(&second.token), None)
		.await;
	assert_eq!(body["status"], "resolved");
	assert_eq!(body["active_tenant"]["id"], acme);

	// Another subject cannot resume the session.
	let (status, _) = app
		.hand_off(json!({
			"email": "mallory@example.com",
			"email_verified": true,
			"sso_session": first.user_session_id,
		}))
		.await;
	assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn scoped_provider_provisions_and_restricts() {
	let app = TestApp::new().await;
	let owner = app.login("owner@example.com").await;
	let acme = app.create_tenant(&owner.token, "Acme").await;
	let carol = app.login("carol@example.com").await;
	let private = app.create_tenant(&carol.token, "Private").await;

	let missing = TenantId::generate().to_string();
	let app = app.with_scopes(&[("corp", acme.as_str()), ("partner", missing.as_str())]);

	let corp = app
		.login_with(json!({
			"email": "carol@example.com",
			"email_verified": true,
			"identity_provider": "corp",
		}))
		.await;
	let (_, body) = app
		.send(Method::GET, "/login/tenant", Some(&corp.token), None)
		.await;
	assert_eq!(body["status"], "resolved");
	assert_eq!(body["active_tenant"]["id"], acme);

	let acme_id: TenantId = acme.parse().unwrap();
	let carol_id: UserId = corp.user_id.parse().unwrap();
	let membership = app
		.state
		.directory
		.get_membership_for(&acme_id, &carol_id)
		.await
		.unwrap()
		.unwrap();
	assert_eq!(membership.provisioned_by.as_deref(), Some("idp:corp"));

	let (_, body) = app
		.send(Method::POST, "/login/token", Some(&corp.token), None)
		.await;
	assert_eq!(body["active_tenant"]["tenant_id"], acme);

	// Switching outside the provider scope is refused.
	let (status, _) = app
		.send(Method::PUT, "/switch", Some(&corp.token), Some(json!({ "tenantId": private })))
		.await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	// A provider scoped only to unknown tenants grants nothing.
	let partner = app
		.login_with(json!({
			"email": "carol@example.com",
			"email_verified": true,
			"identity_provider": "partner",
		}))
		.await;
	let (status, body) = app
		.send(Method::GET, "/login/tenant", Some(&partner.token), None)
		.await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body["error"], "access_denied");
	let (status, _) = app
		.send(Method::POST, "/login/token", Some(&partner.token), None)
		.await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
}
