// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Login-time tenant resolution.
//!
//! Every authentication ends in exactly one of: proceed with an active tenant,
//! or show one interactive step. The transition table:
//!
//! | Condition                                              | Outcome                    |
//! |--------------------------------------------------------|----------------------------|
//! | active-tenant note present and still eligible          | `Resolved`                 |
//! | memberships exist, none inside the provider scope      | `AccessDenied` (fatal)     |
//! | pending invitations, review not yet submitted          | queue `NeedsInvitationReview` |
//! | zero memberships                                       | queue `NeedsTenant`        |
//! | exactly one eligible membership, nothing queued        | record note, `Resolved`    |
//! | several eligible memberships                           | queue `NeedsTenantSelection` |
//!
//! Queued steps are returned in the order above. After each completed step the
//! caller resolves again. The review is offered once per authentication
//! session; invitations left unanswered stay pending for the next login.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tenancy_server_auth::{
	AuthSessionId, IdentityProviderScopes, IdentityProviderTenantScope, Invitation, Membership,
	NoteScope, SessionHost, TenancyError, Tenant, TenantId, User, ACTIVE_TENANT_NOTE,
	IDENTITY_PROVIDER_NOTE, INVITATIONS_REVIEWED_NOTE,
};
use tracing::{debug, info};

use crate::directory::TenantDirectory;
use crate::invitation::{InvitationLifecycle, ReviewOutcome};

type Result<T> = std::result::Result<T, TenancyError>;

/// Re-authentication grace window for tenant selection, in seconds.
/// Switching tenant is not a security-sensitive event.
pub const TENANT_SELECTION_MAX_AUTH_AGE: i64 = i64::MAX;

/// Whether an authentication that happened at `authenticated_at` is too old
/// for an action allowing `max_auth_age` seconds.
pub fn reauthentication_required(
	authenticated_at: DateTime<Utc>,
	now: DateTime<Utc>,
	max_auth_age: i64,
) -> bool {
	(now - authenticated_at).num_seconds() > max_auth_age
}

/// The subject of one authentication attempt.
#[derive(Debug, Clone)]
pub struct Login {
	pub auth_session_id: AuthSessionId,
	pub user: User,
	pub authenticated_at: DateTime<Utc>,
}

/// An interactive screen the user must complete before the login proceeds.
#[derive(Debug, Clone, PartialEq)]
pub enum RequiredStep {
	/// Review pending invitations.
	NeedsInvitationReview { invitations: Vec<Invitation> },
	/// Create a first tenant.
	NeedsTenant,
	/// Choose among the eligible tenants, ordered by name.
	NeedsTenantSelection { tenants: Vec<Tenant> },
}

impl RequiredStep {
	pub fn name(&self) -> &'static str {
		match self {
			RequiredStep::NeedsInvitationReview { .. } => "review_invitations",
			RequiredStep::NeedsTenant => "create_tenant",
			RequiredStep::NeedsTenantSelection { .. } => "select_tenant",
		}
	}

	/// Re-authentication window the step's screen allows, in seconds.
	pub fn max_auth_age(&self) -> Option<i64> {
		match self {
			RequiredStep::NeedsTenantSelection { .. } => Some(TENANT_SELECTION_MAX_AUTH_AGE),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
	Resolved(TenantId),
	NeedsStep(RequiredStep),
}

/// Full result of evaluating the transition table once.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
	/// Active tenant recorded for the session, if any.
	pub active_tenant: Option<TenantId>,
	/// Triggered steps in presentation order.
	pub steps: Vec<RequiredStep>,
}

impl Evaluation {
	pub fn into_resolution(self) -> Result<Resolution> {
		if let Some(step) = self.steps.into_iter().next() {
			return Ok(Resolution::NeedsStep(step));
		}
		self
			.active_tenant
			.map(Resolution::Resolved)
			.ok_or_else(|| TenancyError::Internal("resolution produced no outcome".to_string()))
	}
}

#[derive(Clone)]
pub struct TenantResolver {
	directory: TenantDirectory,
	lifecycle: InvitationLifecycle,
	sessions: Arc<dyn SessionHost>,
	scopes: Arc<IdentityProviderScopes>,
}

impl TenantResolver {
	pub fn new(
		directory: TenantDirectory,
		lifecycle: InvitationLifecycle,
		sessions: Arc<dyn SessionHost>,
		scopes: Arc<IdentityProviderScopes>,
	) -> Self {
		Self {
			directory,
			lifecycle,
			sessions,
			scopes,
		}
	}

	/// Decide what the login needs next.
	pub async fn resolve(&self, login: &Login) -> Result<Resolution> {
		self.evaluate(login).await?.into_resolution()
	}

	/// Run the transition table and return every triggered step.
	#[tracing::instrument(skip(self, login), fields(auth_session_id = %login.auth_session_id, user_id = %login.user.id))]
	pub async fn evaluate(&self, login: &Login) -> Result<Evaluation> {
		let memberships = self
			.directory
			.list_memberships_for_user(&login.user.id)
			.await?;
		let eligible = self.eligible(login, &memberships).await?;

		if let Some(active) = self.active_tenant_fact(login).await? {
			if eligible.iter().any(|m| m.tenant_id == active) {
				self.record_active_tenant(login, &active).await?;
				debug!(tenant_id = %active, "active tenant already recorded");
				return Ok(Evaluation {
					active_tenant: Some(active),
					steps: Vec::new(),
				});
			}
			debug!(tenant_id = %active, "discarding stale active tenant");
			self.clear_active_tenant(login).await?;
		}

		let mut evaluation = Evaluation {
			active_tenant: None,
			steps: Vec::new(),
		};

		if !self.invitations_reviewed(login).await? {
			let invitations = self.lifecycle.pending_for(&login.user).await?;
			if !invitations.is_empty() {
				evaluation
					.steps
					.push(RequiredStep::NeedsInvitationReview { invitations });
			}
		}

		if memberships.is_empty() {
			evaluation.steps.push(RequiredStep::NeedsTenant);
		}

		match eligible.as_slice() {
			[] => {}
			// Recorded only once nothing else is queued, so the fact cannot
			// short-circuit a pending step on the next evaluation.
			[_] if !evaluation.steps.is_empty() => {}
			[only] => {
				self.record_active_tenant(login, &only.tenant_id).await?;
				info!(tenant_id = %only.tenant_id, "single eligible tenant selected");
				evaluation.active_tenant = Some(only.tenant_id);
			}
			several => {
				let mut tenants = Vec::with_capacity(several.len());
				for membership in several {
					tenants.push(self.directory.get_tenant(&membership.tenant_id).await?);
				}
				tenants.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
				evaluation
					.steps
					.push(RequiredStep::NeedsTenantSelection { tenants });
			}
		}

		debug!(
			steps = ?evaluation.steps.iter().map(RequiredStep::name).collect::<Vec<_>>(),
			active_tenant = ?evaluation.active_tenant,
			"tenant resolution evaluated"
		);
		Ok(evaluation)
	}

	/// Create the user's first tenant, then resolve again.
	#[tracing::instrument(skip(self, login), fields(user_id = %login.user.id))]
	pub async fn submit_new_tenant(&self, login: &Login, name: &str) -> Result<Resolution> {
		let memberships = self
			.directory
			.list_memberships_for_user(&login.user.id)
			.await?;
		if !memberships.is_empty() {
			return Err(TenancyError::Validation(
				"tenant creation is only offered to users without a tenant".to_string(),
			));
		}
		self.directory.create_tenant(name, &login.user.id).await?;
		self.resolve(login).await
	}

	/// Apply the invitation review, then resolve again.
	#[tracing::instrument(skip(self, login, accepted, rejected), fields(user_id = %login.user.id))]
	pub async fn submit_invitation_review(
		&self,
		login: &Login,
		accepted: &std::collections::BTreeSet<TenantId>,
		rejected: &std::collections::BTreeSet<TenantId>,
	) -> Result<(ReviewOutcome, Resolution)> {
		let outcome = self.lifecycle.review(&login.user, accepted, rejected).await?;
		self
			.sessions
			.set_note(
				NoteScope::Auth(login.auth_session_id),
				INVITATIONS_REVIEWED_NOTE,
				"true",
			)
			.await?;
		let resolution = self.resolve(login).await?;
		Ok((outcome, resolution))
	}

	/// Record the tenant picked on the selection screen.
	///
	/// A tenant outside the eligible set fails the whole login.
	#[tracing::instrument(skip(self, login), fields(user_id = %login.user.id, tenant_id = %tenant_id))]
	pub async fn submit_selection(&self, login: &Login, tenant_id: &TenantId) -> Result<Resolution> {
		self.ensure_eligible(login, tenant_id).await?;
		self.record_active_tenant(login, tenant_id).await?;
		info!(tenant_id = %tenant_id, "tenant selected");
		Ok(Resolution::Resolved(*tenant_id))
	}

	/// Change the active tenant of an established session.
	///
	/// Subject to the tenant-selection re-authentication window.
	#[tracing::instrument(skip(self, login), fields(user_id = %login.user.id, tenant_id = %tenant_id))]
	pub async fn switch_active_tenant(&self, login: &Login, tenant_id: &TenantId) -> Result<TenantId> {
		if reauthentication_required(
			login.authenticated_at,
			Utc::now(),
			TENANT_SELECTION_MAX_AUTH_AGE,
		) {
			return Err(TenancyError::Unauthenticated);
		}
		self.ensure_eligible(login, tenant_id).await?;
		self.record_active_tenant(login, tenant_id).await?;
		info!(tenant_id = %tenant_id, "active tenant switched");
		Ok(*tenant_id)
	}

	/// The tenant currently recorded for the login, without evaluating.
	pub async fn active_tenant(&self, login: &Login) -> Result<Option<TenantId>> {
		self.active_tenant_fact(login).await
	}

	/// The identity-provider scope that applies to this login.
	pub async fn scope(&self, login: &Login) -> Result<IdentityProviderTenantScope> {
		let alias = self
			.sessions
			.get_note(NoteScope::Auth(login.auth_session_id), IDENTITY_PROVIDER_NOTE)
			.await?;
		Ok(self.scopes.scope_for(alias.as_deref()))
	}

	async fn ensure_eligible(&self, login: &Login, tenant_id: &TenantId) -> Result<()> {
		let memberships = self
			.directory
			.list_memberships_for_user(&login.user.id)
			.await?;
		let eligible = self.eligible(login, &memberships).await?;
		if eligible.iter().any(|m| &m.tenant_id == tenant_id) {
			Ok(())
		} else {
			Err(TenancyError::AccessDenied(
				"selected tenant is not available to this login".to_string(),
			))
		}
	}

	/// Memberships inside the provider scope.
	///
	/// Fails when a scoped login has memberships but none inside the scope, or
	/// has no memberships at all, since no tenant it could create would be
	/// inside the scope either.
	async fn eligible(&self, login: &Login, memberships: &[Membership]) -> Result<Vec<Membership>> {
		let scope = self.scope(login).await?;
		let eligible: Vec<Membership> = memberships
			.iter()
			.filter(|m| scope.allows(&m.tenant_id))
			.cloned()
			.collect();

		if eligible.is_empty() && (scope.is_restricted() || !memberships.is_empty()) {
			return Err(TenancyError::AccessDenied(
				"no access to any of the configured tenants".to_string(),
			));
		}
		Ok(eligible)
	}

	async fn invitations_reviewed(&self, login: &Login) -> Result<bool> {
		let note = self
			.sessions
			.get_note(NoteScope::Auth(login.auth_session_id), INVITATIONS_REVIEWED_NOTE)
			.await?;
		Ok(note.is_some())
	}

	async fn active_tenant_fact(&self, login: &Login) -> Result<Option<TenantId>> {
		let auth_scope = NoteScope::Auth(login.auth_session_id);
		let mut raw = self.sessions.get_note(auth_scope, ACTIVE_TENANT_NOTE).await?;

		if raw.is_none() {
			if let Some(user_session) = self
				.sessions
				.existing_user_session(&login.auth_session_id)
				.await?
			{
				raw = self
					.sessions
					.get_note(NoteScope::User(user_session), ACTIVE_TENANT_NOTE)
					.await?;
			}
		}

		Ok(raw.and_then(|value| value.parse::<TenantId>().ok()))
	}

	async fn record_active_tenant(&self, login: &Login, tenant_id: &TenantId) -> Result<()> {
		let value = tenant_id.to_string();
		self
			.sessions
			.set_note(NoteScope::Auth(login.auth_session_id), ACTIVE_TENANT_NOTE, &value)
			.await?;
		if let Some(user_session) = self
			.sessions
			.existing_user_session(&login.auth_session_id)
			.await?
		{
			self
				.sessions
				.set_note(NoteScope::User(user_session), ACTIVE_TENANT_NOTE, &value)
				.await?;
		}
		Ok(())
	}

	async fn clear_active_tenant(&self, login: &Login) -> Result<()> {
		self
			.sessions
			.remove_note(NoteScope::Auth(login.auth_session_id), ACTIVE_TENANT_NOTE)
			.await?;
		if let Some(user_session) = self
			.sessions
			.existing_user_session(&login.auth_session_id)
			.await?
		{
			self
				.sessions
				.remove_note(NoteScope::User(user_session), ACTIVE_TENANT_NOTE)
				.await?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{directory_fixture, DirectoryFixture};
	use std::collections::{BTreeSet, HashMap};
	use tenancy_server_auth::{role_set, InMemorySessionHost, UserSessionId, TENANT_USER_ROLE};
	use tenancy_server_db::testing::create_test_user;

	struct Harness {
		fx: DirectoryFixture,
		host: Arc<InMemorySessionHost>,
		resolver: TenantResolver,
	}

	async fn harness_with_scopes(scopes: IdentityProviderScopes) -> Harness {
		let fx = directory_fixture().await;
		let host = Arc::new(InMemorySessionHost::new());
		let lifecycle = InvitationLifecycle::new(fx.directory.clone());
		let resolver = TenantResolver::new(
			fx.directory.clone(),
			lifecycle,
			host.clone(),
			Arc::new(scopes),
		);
		Harness { fx, host, resolver }
	}

	async fn harness() -> Harness {
		harness_with_scopes(IdentityProviderScopes::default()).await
	}

	impl Harness {
		async fn login(&self, user: &User, idp: Option<&str>, resume: Option<UserSessionId>) -> Login {
			let session = self
				.host
				.open_auth_session(user.id, idp, resume)
				.await
				.unwrap();
			Login {
				auth_session_id: session.id,
				user: user.clone(),
				authenticated_at: session.created_at,
			}
		}
	}

	fn scoped(alias: &str, tenants: &[TenantId]) -> IdentityProviderScopes {
		let mut by_alias = HashMap::new();
		by_alias.insert(
			alias.to_string(),
			IdentityProviderTenantScope::Restricted(tenants.iter().copied().collect()),
		);
		IdentityProviderScopes::new(by_alias)
	}

	#[tokio::test]
	async fn zero_memberships_needs_tenant_then_resolves() {
		let h = harness().await;
		let a = create_test_user(&h.fx.pool, "a@example.com").await;

		let login = h.login(&a, None, None).await;
		assert_eq!(
			h.resolver.resolve(&login).await.unwrap(),
			Resolution::NeedsStep(RequiredStep::NeedsTenant)
		);

		let resolution = h.resolver.submit_new_tenant(&login, "Acme").await.unwrap();
		let Resolution::Resolved(tenant_id) = resolution else {
			panic!("expected resolution, got {resolution:?}");
		};

		let fresh = h.login(&a, None, None).await;
		assert_eq!(
			h.resolver.resolve(&fresh).await.unwrap(),
			Resolution::Resolved(tenant_id)
		);
	}

	#[tokio::test]
	async fn blank_tenant_name_reprompts() {
		let h = harness().await;
		let a = create_test_user(&h.fx.pool, "a@example.com").await;
		let login = h.login(&a, None, None).await;

		let result = h.resolver.submit_new_tenant(&login, "  ").await;
		assert!(matches!(result, Err(TenancyError::Validation(_))));
		assert_eq!(
			h.resolver.resolve(&login).await.unwrap(),
			Resolution::NeedsStep(RequiredStep::NeedsTenant)
		);
	}

	#[tokio::test]
	async fn two_memberships_need_selection_of_exactly_those() {
		let h = harness().await;
		let a = create_test_user(&h.fx.pool, "a@example.com").await;
		let other = create_test_user(&h.fx.pool, "o@example.com").await;
		let t1 = h.fx.directory.create_tenant("Beta", &a.id).await.unwrap();
		let t2 = h.fx.directory.create_tenant("Acme", &a.id).await.unwrap();
		let t3 = h.fx.directory.create_tenant("Gamma", &other.id).await.unwrap();

		let login = h.login(&a, None, None).await;
		let Resolution::NeedsStep(RequiredStep::NeedsTenantSelection { tenants }) =
			h.resolver.resolve(&login).await.unwrap()
		else {
			panic!("expected tenant selection");
		};
		let offered: Vec<_> = tenants.iter().map(|t| t.id).collect();
		assert_eq!(offered, vec![t2.id, t1.id]);

		let refused = h.resolver.submit_selection(&login, &t3.id).await;
		assert!(matches!(refused, Err(TenancyError::AccessDenied(_))));

		assert_eq!(
			h.resolver.submit_selection(&login, &t1.id).await.unwrap(),
			Resolution::Resolved(t1.id)
		);
		assert_eq!(
			h.resolver.resolve(&login).await.unwrap(),
			Resolution::Resolved(t1.id)
		);
	}

	#[tokio::test]
	async fn sso_resume_recovers_selection_from_user_session() {
		let h = harness().await;
		let a = create_test_user(&h.fx.pool, "a@example.com").await;
		let t1 = h.fx.directory.create_tenant("Acme", &a.id).await.unwrap();
		h.fx.directory.create_tenant("Beta", &a.id).await.unwrap();

		let first = h.login(&a, None, None).await;
		h.resolver.submit_selection(&first, &t1.id).await.unwrap();
		let user_session = h
			.host
			.existing_user_session(&first.auth_session_id)
			.await
			.unwrap();

		let resumed = h.login(&a, None, user_session).await;
		assert_eq!(
			h.resolver.resolve(&resumed).await.unwrap(),
			Resolution::Resolved(t1.id)
		);
		let copied = h
			.host
			.get_note(NoteScope::Auth(resumed.auth_session_id), ACTIVE_TENANT_NOTE)
			.await
			.unwrap();
		assert_eq!(copied, Some(t1.id.to_string()));

		// A brand new session without SSO still has to choose.
		let fresh = h.login(&a, None, None).await;
		assert!(matches!(
			h.resolver.resolve(&fresh).await.unwrap(),
			Resolution::NeedsStep(RequiredStep::NeedsTenantSelection { .. })
		));
	}

	#[tokio::test]
	async fn stale_active_tenant_is_discarded() {
		let h = harness().await;
		let a = create_test_user(&h.fx.pool, "a@example.com").await;
		let t1 = h.fx.directory.create_tenant("Acme", &a.id).await.unwrap();
		let t2 = h.fx.directory.create_tenant("Beta", &a.id).await.unwrap();

		let login = h.login(&a, None, None).await;
		h.resolver.submit_selection(&login, &t1.id).await.unwrap();
		h.fx.directory.delete_tenant(&t1.id).await.unwrap();

		assert_eq!(
			h.resolver.resolve(&login).await.unwrap(),
			Resolution::Resolved(t2.id)
		);
	}

	#[tokio::test]
	async fn scoped_provider_filters_eligible_memberships() {
		let fx = directory_fixture().await;
		let a = create_test_user(&fx.pool, "a@example.com").await;
		let t1 = fx.directory.create_tenant("Acme", &a.id).await.unwrap();
		fx.directory.create_tenant("Beta", &a.id).await.unwrap();

		let host = Arc::new(InMemorySessionHost::new());
		let resolver = TenantResolver::new(
			fx.directory.clone(),
			InvitationLifecycle::new(fx.directory.clone()),
			host.clone(),
			Arc::new(scoped("corp", &[t1.id])),
		);

		let session = host.open_auth_session(a.id, Some("corp"), None).await.unwrap();
		let login = Login {
			auth_session_id: session.id,
			user: a.clone(),
			authenticated_at: session.created_at,
		};
		assert_eq!(
			resolver.resolve(&login).await.unwrap(),
			Resolution::Resolved(t1.id)
		);

		let direct = host.open_auth_session(a.id, None, None).await.unwrap();
		let direct = Login {
			auth_session_id: direct.id,
			user: a,
			authenticated_at: direct.created_at,
		};
		assert!(matches!(
			resolver.resolve(&direct).await.unwrap(),
			Resolution::NeedsStep(RequiredStep::NeedsTenantSelection { .. })
		));
	}

	#[tokio::test]
	async fn scoped_provider_without_overlap_denies_access() {
		let fx = directory_fixture().await;
		let a = create_test_user(&fx.pool, "a@example.com").await;
		let admin = create_test_user(&fx.pool, "admin@example.com").await;
		let t1 = fx.directory.create_tenant("Acme", &admin.id).await.unwrap();
		fx.directory.create_tenant("Beta", &a.id).await.unwrap();

		let host = Arc::new(InMemorySessionHost::new());
		let resolver = TenantResolver::new(
			fx.directory.clone(),
			InvitationLifecycle::new(fx.directory.clone()),
			host.clone(),
			Arc::new(scoped("corp", &[t1.id])),
		);
		let session = host.open_auth_session(a.id, Some("corp"), None).await.unwrap();
		let login = Login {
			auth_session_id: session.id,
			user: a,
			authenticated_at: session.created_at,
		};

		let result = resolver.resolve(&login).await;
		assert!(matches!(result, Err(TenancyError::AccessDenied(_))));
		assert!(result.unwrap_err().is_fatal_to_login());
	}

	#[tokio::test]
	async fn invitations_are_reviewed_before_tenant_creation() {
		let h = harness().await;
		let admin = create_test_user(&h.fx.pool, "admin@example.com").await;
		let x = create_test_user(&h.fx.pool, "x@y.com").await;
		let tenant = h.fx.directory.create_tenant("Acme", &admin.id).await.unwrap();
		h.fx.directory
			.add_invitation(&tenant.id, "x@y.com", Some(&admin), Some(role_set(["r"])))
			.await
			.unwrap();

		let login = h.login(&x, None, None).await;
		let evaluation = h.resolver.evaluate(&login).await.unwrap();
		let names: Vec<_> = evaluation.steps.iter().map(RequiredStep::name).collect();
		assert_eq!(names, vec!["review_invitations", "create_tenant"]);

		let refused = h
			.resolver
			.submit_invitation_review(&login, &BTreeSet::new(), &[tenant.id].into())
			.await;
		assert!(matches!(refused, Err(TenancyError::Validation(_))));

		let (outcome, resolution) = h
			.resolver
			.submit_invitation_review(&login, &[tenant.id].into(), &BTreeSet::new())
			.await
			.unwrap();
		assert_eq!(outcome.accepted[0].roles, role_set(["r"]));
		assert_eq!(resolution, Resolution::Resolved(tenant.id));
	}

	#[tokio::test]
	async fn second_tenant_creation_is_refused() {
		let h = harness().await;
		let a = create_test_user(&h.fx.pool, "a@example.com").await;
		h.fx.directory.create_tenant("Acme", &a.id).await.unwrap();

		let login = h.login(&a, None, None).await;
		let result = h.resolver.submit_new_tenant(&login, "Beta").await;
		assert!(matches!(result, Err(TenancyError::Validation(_))));
	}

	#[tokio::test]
	async fn switch_requires_membership() {
		let h = harness().await;
		let a = create_test_user(&h.fx.pool, "a@example.com").await;
		let b = create_test_user(&h.fx.pool, "b@example.com").await;
		let t1 = h.fx.directory.create_tenant("Acme", &a.id).await.unwrap();
		let t2 = h.fx.directory.create_tenant("Beta", &b.id).await.unwrap();
		h.fx.directory
			.grant_membership(&t2.id, &a.id, role_set([TENANT_USER_ROLE]))
			.await
			.unwrap();

		let login = h.login(&a, None, None).await;
		h.resolver.submit_selection(&login, &t1.id).await.unwrap();
		assert_eq!(
			h.resolver.switch_active_tenant(&login, &t2.id).await.unwrap(),
			t2.id
		);
		assert_eq!(h.resolver.active_tenant(&login).await.unwrap(), Some(t2.id));

		let foreign = h
			.resolver
			.switch_active_tenant(&login, &TenantId::generate())
			.await;
		assert!(matches!(foreign, Err(TenancyError::AccessDenied(_))));
	}

	#[tokio::test]
	async fn review_is_not_bypassed_by_a_single_membership() {
		let h = harness().await;
		let admin = create_test_user(&h.fx.pool, "admin@example.com").await;
		let a = create_test_user(&h.fx.pool, "a@example.com").await;
		let own = h.fx.directory.create_tenant("Acme", &a.id).await.unwrap();
		let other = h.fx.directory.create_tenant("Beta", &admin.id).await.unwrap();
		h.fx.directory
			.add_invitation(&other.id, "a@example.com", Some(&admin), None)
			.await
			.unwrap();

		let login = h.login(&a, None, None).await;
		for _ in 0..2 {
			let evaluation = h.resolver.evaluate(&login).await.unwrap();
			assert_eq!(evaluation.active_tenant, None);
			assert!(matches!(
				evaluation.into_resolution().unwrap(),
				Resolution::NeedsStep(RequiredStep::NeedsInvitationReview { .. })
			));
		}
		assert_eq!(h.resolver.active_tenant(&login).await.unwrap(), None);

		let (outcome, resolution) = h
			.resolver
			.submit_invitation_review(&login, &BTreeSet::new(), &BTreeSet::new())
			.await
			.unwrap();
		assert!(outcome.accepted.is_empty());
		assert_eq!(resolution, Resolution::Resolved(own.id));
		assert_eq!(
			h.resolver.resolve(&login).await.unwrap(),
			Resolution::Resolved(own.id)
		);

		// Unanswered invitations stay pending and are offered on the next login.
		let pending = h
			.fx
			.directory
			.list_invitations_for_email("a@example.com")
			.await
			.unwrap();
		assert_eq!(pending.len(), 1);
		let next = h.login(&a, None, None).await;
		assert!(matches!(
			h.resolver.resolve(&next).await.unwrap(),
			Resolution::NeedsStep(RequiredStep::NeedsInvitationReview { .. })
		));
	}

	#[tokio::test]
	async fn partial_review_proceeds_to_selection() {
		let h = harness().await;
		let admin = create_test_user(&h.fx.pool, "admin@example.com").await;
		let a = create_test_user(&h.fx.pool, "a@example.com").await;
		let t1 = h.fx.directory.create_tenant("Acme", &a.id).await.unwrap();
		let t2 = h.fx.directory.create_tenant("Beta", &a.id).await.unwrap();
		let t3 = h.fx.directory.create_tenant("Gamma", &admin.id).await.unwrap();
		let t4 = h.fx.directory.create_tenant("Delta", &admin.id).await.unwrap();
		for tenant in [&t3, &t4] {
			h.fx.directory
				.add_invitation(&tenant.id, "a@example.com", Some(&admin), None)
				.await
				.unwrap();
		}

		let login = h.login(&a, None, None).await;
		let names: Vec<_> = h
			.resolver
			.evaluate(&login)
			.await
			.unwrap()
			.steps
			.iter()
			.map(RequiredStep::name)
			.collect();
		assert_eq!(names, vec!["review_invitations", "select_tenant"]);

		let (_, resolution) = h
			.resolver
			.submit_invitation_review(&login, &[t3.id].into(), &BTreeSet::new())
			.await
			.unwrap();
		let Resolution::NeedsStep(RequiredStep::NeedsTenantSelection { tenants }) = resolution else {
			panic!("expected tenant selection, got {resolution:?}");
		};
		let offered: Vec<_> = tenants.iter().map(|t| t.id).collect();
		assert_eq!(offered, vec![t1.id, t2.id, t3.id]);

		let pending = h
			.fx
			.directory
			.list_invitations_for_email("a@example.com")
			.await
			.unwrap();
		assert_eq!(pending.len(), 1);
		assert_eq!(pending[0].tenant_id, t4.id);
	}

	#[tokio::test]
	async fn tenant_selection_allows_any_auth_age() {
		let h = harness().await;
		let a = create_test_user(&h.fx.pool, "a@example.com").await;
		let t1 = h.fx.directory.create_tenant("Acme", &a.id).await.unwrap();
		let t2 = h.fx.directory.create_tenant("Beta", &a.id).await.unwrap();

		let mut login = h.login(&a, None, None).await;
		let Resolution::NeedsStep(step) = h.resolver.resolve(&login).await.unwrap() else {
			panic!("expected tenant selection");
		};
		assert_eq!(step.max_auth_age(), Some(TENANT_SELECTION_MAX_AUTH_AGE));
		assert_eq!(RequiredStep::NeedsTenant.max_auth_age(), None);

		h.resolver.submit_selection(&login, &t1.id).await.unwrap();
		login.authenticated_at = Utc::now() - chrono::Duration::days(3650);
		assert_eq!(
			h.resolver.switch_active_tenant(&login, &t2.id).await.unwrap(),
			t2.id
		);
	}

	#[test]
	fn reauthentication_window_is_exclusive() {
		let now = Utc::now();
		let authenticated_at = now - chrono::Duration::seconds(60);
		assert!(!reauthentication_required(authenticated_at, now, 60));
		assert!(reauthentication_required(authenticated_at, now, 59));
		assert!(!reauthentication_required(
			now - chrono::Duration::days(36500),
			now,
			TENANT_SELECTION_MAX_AUTH_AGE
		));
	}
}
