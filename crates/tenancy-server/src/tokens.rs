// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Opaque bearer tokens bound to an authentication session.
//!
//! Only SHA-256 hashes of issued tokens are kept. A session token drives the
//! login screens; an access token is issued once the login has resolved to a
//! tenant.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tenancy_server_auth::{generate_session_token, hash_token, AuthSessionId};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	Session,
	Access,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
	pub auth_session_id: AuthSessionId,
	pub kind: TokenKind,
	pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct TokenRegistry {
	grants: RwLock<HashMap<String, Grant>>,
}

impl TokenRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn issue_session_token(&self, auth_session_id: AuthSessionId, ttl: Duration) -> String {
		self.issue(auth_session_id, TokenKind::Session, ttl).await
	}

	pub async fn issue_access_token(&self, auth_session_id: AuthSessionId, ttl: Duration) -> String {
		self.issue(auth_session_id, TokenKind::Access, ttl).await
	}

	async fn issue(&self, auth_session_id: AuthSessionId, kind: TokenKind, ttl: Duration) -> String {
		let token = generate_session_token();
		let grant = Grant {
			auth_session_id,
			kind,
			expires_at: Utc::now() + ttl,
		};
		let mut grants = self.grants.write().await;
		let now = Utc::now();
		grants.retain(|_, g| g.expires_at > now);
		grants.insert(hash_token(&token), grant);
		tracing::debug!(auth_session_id = %auth_session_id, kind = ?kind, "token issued");
		token
	}

	/// The live grant for a presented token. Expired grants are dropped.
	pub async fn lookup(&self, token: &str) -> Option<Grant> {
		let hash = hash_token(token);
		let grant = self.grants.read().await.get(&hash).cloned()?;
		if grant.expires_at <= Utc::now() {
			self.grants.write().await.remove(&hash);
			return None;
		}
		Some(grant)
	}

	/// Revoke every token issued for an authentication session.
	pub async fn revoke_session(&self, auth_session_id: &AuthSessionId) -> usize {
		let mut grants = self.grants.write().await;
		let before = grants.len();
		grants.retain(|_, g| &g.auth_session_id != auth_session_id);
		before - grants.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn issued_tokens_resolve_to_their_session() {
		let registry = TokenRegistry::new();
		let session = AuthSessionId::generate();
		let token = registry
			.issue_session_token(session, Duration::minutes(5))
			.await;

		let grant = registry.lookup(&token).await.unwrap();
		assert_eq!(grant.auth_session_id, session);
		assert_eq!(grant.kind, TokenKind::Session);
		assert!(registry.lookup("not-a-token").await.is_none());
	}

	#[tokio::test]
	async fn expired_tokens_are_rejected() {
		let registry = TokenRegistry::new();
		let token = registry
			.issue_access_token(AuthSessionId::generate(), Duration::seconds(-1))
			.await;
		assert!(registry.lookup(&token).await.is_none());
	}

	#[tokio::test]
	async fn revoke_drops_all_tokens_of_a_session() {
		let registry = TokenRegistry::new();
		let session = AuthSessionId::generate();
		let other = AuthSessionId::generate();
		let a = registry.issue_session_token(session, Duration::minutes(5)).await;
		let b = registry.issue_access_token(session, Duration::minutes(5)).await;
		let c = registry.issue_access_token(other, Duration::minutes(5)).await;

		assert_eq!(registry.revoke_session(&session).await, 2);
		assert!(registry.lookup(&a).await.is_none());
		assert!(registry.lookup(&b).await.is_none());
		assert!(registry.lookup(&c).await.is_some());
	}
}
