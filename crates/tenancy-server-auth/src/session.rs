// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session notes exchanged with the identity host.
//!
//! Every login runs inside an *authentication session*. Once the subject is
//! known the authentication session belongs to a long-lived *user session*;
//! an SSO re-authentication opens a fresh authentication session attached to
//! the same user session. Both carry named string notes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::TenancyError;
use crate::types::{AuthSessionId, UserId, UserSessionId};

/// Note holding the tenant chosen for the session.
pub const ACTIVE_TENANT_NOTE: &str = "active-tenant-id";

/// Note holding the alias of the brokering identity provider, if any.
pub const IDENTITY_PROVIDER_NOTE: &str = "identity_provider";

/// Note set on an authentication session once its invitation review is submitted.
pub const INVITATIONS_REVIEWED_NOTE: &str = "invitations-reviewed";

/// Which session a note is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteScope {
	Auth(AuthSessionId),
	User(UserSessionId),
}

/// Operations the tenant flow needs from the identity host's session store.
#[async_trait]
pub trait SessionHost: Send + Sync {
	async fn get_note(&self, scope: NoteScope, key: &str) -> Result<Option<String>, TenancyError>;
	async fn set_note(&self, scope: NoteScope, key: &str, value: &str) -> Result<(), TenancyError>;
	async fn remove_note(&self, scope: NoteScope, key: &str) -> Result<(), TenancyError>;
	/// The user session an authentication session belongs to, if established.
	async fn existing_user_session(
		&self,
		auth_session: &AuthSessionId,
	) -> Result<Option<UserSessionId>, TenancyError>;
}

/// A single authentication attempt for a verified subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
	pub id: AuthSessionId,
	pub user_id: UserId,
	pub user_session_id: UserSessionId,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct SessionState {
	auth_sessions: HashMap<AuthSessionId, AuthSession>,
	user_sessions: HashMap<UserSessionId, UserId>,
	notes: HashMap<NoteScope, HashMap<String, String>>,
}

/// Process-local session store used when the server acts as its own identity host.
#[derive(Debug, Default)]
pub struct InMemorySessionHost {
	state: RwLock<SessionState>,
}

impl InMemorySessionHost {
	pub fn new() -> Self {
		Self::default()
	}

	/// Open an authentication session for `user_id`.
	///
	/// `resume` names the user session of an earlier login (SSO). An unknown
	/// user session starts a fresh one; a user session owned by a different
	/// subject is refused.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn open_auth_session(
		&self,
		user_id: UserId,
		identity_provider: Option<&str>,
		resume: Option<UserSessionId>,
	) -> Result<AuthSession, TenancyError> {
		let mut state = self.state.write().await;

		let user_session_id = match resume {
			Some(existing) => match state.user_sessions.get(&existing) {
				Some(owner) if *owner == user_id => existing,
				Some(_) => {
					return Err(TenancyError::Forbidden(
						"user session belongs to another subject".to_string(),
					));
				}
				None => {
					tracing::debug!(user_session_id = %existing, "resumed user session unknown, starting fresh");
					let fresh = UserSessionId::generate();
					state.user_sessions.insert(fresh, user_id);
					fresh
				}
			},
			None => {
				let fresh = UserSessionId::generate();
				state.user_sessions.insert(fresh, user_id);
				fresh
			}
		};

		let session = AuthSession {
			id: AuthSessionId::generate(),
			user_id,
			user_session_id,
			created_at: Utc::now(),
		};
		state.auth_sessions.insert(session.id, session.clone());

		if let Some(alias) = identity_provider.map(str::trim).filter(|a| !a.is_empty()) {
			state
				.notes
				.entry(NoteScope::Auth(session.id))
				.or_default()
				.insert(IDENTITY_PROVIDER_NOTE.to_string(), alias.to_string());
		}

		tracing::debug!(auth_session_id = %session.id, user_session_id = %user_session_id, "authentication session opened");
		Ok(session)
	}

	pub async fn get_auth_session(&self, id: &AuthSessionId) -> Option<AuthSession> {
		self.state.read().await.auth_sessions.get(id).cloned()
	}

	/// Drop an authentication session and its notes. The user session survives.
	pub async fn close_auth_session(&self, id: &AuthSessionId) -> bool {
		let mut state = self.state.write().await;
		state.notes.remove(&NoteScope::Auth(*id));
		state.auth_sessions.remove(id).is_some()
	}
}

#[async_trait]
impl SessionHost for InMemorySessionHost {
	async fn get_note(&self, scope: NoteScope, key: &str) -> Result<Option<String>, TenancyError> {
		let state = self.state.read().await;
		Ok(state
			.notes
			.get(&scope)
			.and_then(|notes| notes.get(key))
			.cloned())
	}

	async fn set_note(&self, scope: NoteScope, key: &str, value: &str) -> Result<(), TenancyError> {
		let mut state = self.state.write().await;
		let known = match scope {
			NoteScope::Auth(id) => state.auth_sessions.contains_key(&id),
			NoteScope::User(id) => state.user_sessions.contains_key(&id),
		};
		if !known {
			return Err(TenancyError::NotFound(format!("session {scope:?}")));
		}
		state
			.notes
			.entry(scope)
			.or_default()
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	async fn remove_note(&self, scope: NoteScope, key: &str) -> Result<(), TenancyError> {
		let mut state = self.state.write().await;
		if let Some(notes) = state.notes.get_mut(&scope) {
			notes.remove(key);
		}
		Ok(())
	}

	async fn existing_user_session(
		&self,
		auth_session: &AuthSessionId,
	) -> Result<Option<UserSessionId>, TenancyError> {
		let state = self.state.read().await;
		Ok(state
			.auth_sessions
			.get(auth_session)
			.map(|session| session.user_session_id))
	}
}
