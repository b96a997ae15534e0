// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Invitation lifecycle: `Pending -> Accepted | Rejected`.
//!
//! Both terminal states delete the invitation row. Accepting converts the
//! invitation into a membership inside the same transaction. The inviter, if
//! any, is told about the outcome on a spawned task; delivery failures never
//! affect the directory.

use std::collections::BTreeSet;
use tenancy_server_auth::{
	Invitation, InvitationId, InvitationOutcome, Membership, TenancyError, TenantId,
	TenantNotification, User,
};
use tracing::info;

use crate::directory::TenantDirectory;
use crate::notify::dispatch;

type Result<T> = std::result::Result<T, TenancyError>;

/// What a batch review changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewOutcome {
	pub accepted: Vec<Membership>,
	pub rejected: Vec<TenantId>,
	/// Invitations left pending because they were in neither set.
	pub still_pending: usize,
}

#[derive(Clone)]
pub struct InvitationLifecycle {
	directory: TenantDirectory,
}

impl InvitationLifecycle {
	pub fn new(directory: TenantDirectory) -> Self {
		Self { directory }
	}

	/// Pending invitations offered to `user` at login.
	///
	/// Only verified addresses are offered invitations.
	pub async fn pending_for(&self, user: &User) -> Result<Vec<Invitation>> {
		if !user.email_verified {
			return Ok(Vec::new());
		}
		self.directory.list_invitations_for_email(&user.email).await
	}

	/// Accept an invitation addressed to `user`.
	///
	/// If `user` is already a member the invitation's roles are merged into the
	/// existing membership.
	#[tracing::instrument(skip(self, user), fields(invitation_id = %id, user_id = %user.id))]
	pub async fn accept(&self, id: &InvitationId, user: &User) -> Result<Membership> {
		let invitation = self.addressed_to(id, user).await?;

		let membership = self
			.directory
			.store()
			.accept_invitation(id, &user.id)
			.await?
			.ok_or_else(|| TenancyError::NotFound(format!("invitation {id}")))?;

		info!(
			invitation_id = %id,
			tenant_id = %invitation.tenant_id,
			membership_id = %membership.id,
			"invitation accepted"
		);
		self
			.notify_inviter(&invitation, InvitationOutcome::Accepted)
			.await;
		Ok(membership)
	}

	/// Decline an invitation addressed to `user`. No membership is created.
	#[tracing::instrument(skip(self, user), fields(invitation_id = %id, user_id = %user.id))]
	pub async fn reject(&self, id: &InvitationId, user: &User) -> Result<()> {
		let invitation = self.addressed_to(id, user).await?;

		if !self.directory.store().delete_invitation(id).await? {
			return Err(TenancyError::NotFound(format!("invitation {id}")));
		}

		info!(invitation_id = %id, tenant_id = %invitation.tenant_id, "invitation declined");
		self
			.notify_inviter(&invitation, InvitationOutcome::Rejected)
			.await;
		Ok(())
	}

	/// Apply a batch of answers to `user`'s pending invitations, keyed by tenant.
	///
	/// A tenant in both sets is accepted. Tenants without a pending invitation
	/// for `user` are ignored. A user without memberships must accept at least
	/// one invitation.
	#[tracing::instrument(skip(self, user, accepted, rejected), fields(user_id = %user.id))]
	pub async fn review(
		&self,
		user: &User,
		accepted: &BTreeSet<TenantId>,
		rejected: &BTreeSet<TenantId>,
	) -> Result<ReviewOutcome> {
		let pending = self.pending_for(user).await?;
		let has_memberships = !self
			.directory
			.list_memberships_for_user(&user.id)
			.await?
			.is_empty();

		let accepts_any = pending.iter().any(|inv| accepted.contains(&inv.tenant_id));
		if !has_memberships && !accepts_any {
			return Err(TenancyError::Validation(
				"accept at least one invitation to continue".to_string(),
			));
		}

		let mut outcome = ReviewOutcome::default();
		for invitation in pending {
			if accepted.contains(&invitation.tenant_id) {
				outcome
					.accepted
					.push(self.accept(&invitation.id, user).await?);
			} else if rejected.contains(&invitation.tenant_id) {
				self.reject(&invitation.id, user).await?;
				outcome.rejected.push(invitation.tenant_id);
			} else {
				outcome.still_pending += 1;
			}
		}

		tracing::debug!(
			accepted = outcome.accepted.len(),
			rejected = outcome.rejected.len(),
			still_pending = outcome.still_pending,
			"invitation review applied"
		);
		Ok(outcome)
	}

	async fn addressed_to(&self, id: &InvitationId, user: &User) -> Result<Invitation> {
		let invitation = self.directory.get_invitation(id).await?;
		if invitation.email != user.email {
			return Err(TenancyError::Forbidden(
				"invitation is addressed to another email".to_string(),
			));
		}
		Ok(invitation)
	}

	async fn notify_inviter(&self, invitation: &Invitation, outcome: InvitationOutcome) {
		let Some(inviter_id) = invitation.invited_by else {
			return;
		};

		let inviter = match self.directory.user_store().get_user_by_id(&inviter_id).await {
			Ok(Some(inviter)) => inviter,
			Ok(None) => {
				tracing::debug!(inviter_id = %inviter_id, "inviter no longer exists, skipping notification");
				return;
			}
			Err(e) => {
				tracing::warn!(inviter_id = %inviter_id, error = %e, "failed to load inviter");
				return;
			}
		};
		let tenant_name = match self.directory.store().get_tenant_by_id(&invitation.tenant_id).await {
			Ok(Some(tenant)) => tenant.name,
			Ok(None) => return,
			Err(e) => {
				tracing::warn!(tenant_id = %invitation.tenant_id, error = %e, "failed to load tenant");
				return;
			}
		};

		dispatch(
			self.directory.notifier(),
			inviter.email,
			TenantNotification::InvitationAnswered {
				tenant_name,
				invitee_email: invitation.email.clone(),
				outcome,
			},
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{directory_fixture, FailingNotifier, RecordingNotifier};
	use std::sync::Arc;
	use tenancy_server_auth::{role_set, User};
	use tenancy_server_db::testing::create_test_user;

	fn ids(tenants: &[TenantId]) -> BTreeSet<TenantId> {
		tenants.iter().copied().collect()
	}

	#[tokio::test]
	async fn accepting_creates_membership_and_notifies_inviter() {
		let notifier = Arc::new(RecordingNotifier::default());
		let fx = directory_fixture().await;
		let directory = fx.directory.clone().with_notifier(notifier.clone());
		let lifecycle = InvitationLifecycle::new(directory.clone());
		let admin = create_test_user(&fx.pool, "admin@example.com").await;
		let invitee = create_test_user(&fx.pool, "x@y.com").await;
		let tenant = directory.create_tenant("Acme", &admin.id).await.unwrap();

		let invitation = directory
			.add_invitation(&tenant.id, "x@y.com", Some(&admin), Some(role_set(["r"])))
			.await
			.unwrap();
		let membership = lifecycle.accept(&invitation.id, &invitee).await.unwrap();

		assert_eq!(membership.tenant_id, tenant.id);
		assert_eq!(membership.user_id, invitee.id);
		assert_eq!(membership.roles, role_set(["r"]));
		assert!(matches!(
			directory.get_invitation(&invitation.id).await,
			Err(TenancyError::NotFound(_))
		));

		notifier.wait_for(2).await;
		let answered = notifier
			.sent()
			.into_iter()
			.find(|(_, n)| n.kind() == "invitation_accepted")
			.unwrap();
		assert_eq!(answered.0, "admin@example.com");
	}

	#[tokio::test]
	async fn rejecting_creates_nothing() {
		let fx = directory_fixture().await;
		let lifecycle = InvitationLifecycle::new(fx.directory.clone());
		let admin = create_test_user(&fx.pool, "admin@example.com").await;
		let invitee = create_test_user(&fx.pool, "x@y.com").await;
		let tenant = fx.directory.create_tenant("Acme", &admin.id).await.unwrap();

		let invitation = fx
			.directory
			.add_invitation(&tenant.id, "x@y.com", Some(&admin), None)
			.await
			.unwrap();
		lifecycle.reject(&invitation.id, &invitee).await.unwrap();

		assert!(fx
			.directory
			.list_memberships_for_user(&invitee.id)
			.await
			.unwrap()
			.is_empty());
		assert!(lifecycle.pending_for(&invitee).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn notification_failure_does_not_fail_acceptance() {
		let fx = directory_fixture().await;
		let directory = fx.directory.clone().with_notifier(Arc::new(FailingNotifier));
		let lifecycle = InvitationLifecycle::new(directory.clone());
		let admin = create_test_user(&fx.pool, "admin@example.com").await;
		let invitee = create_test_user(&fx.pool, "x@y.com").await;
		let tenant = directory.create_tenant("Acme", &admin.id).await.unwrap();

		let invitation = directory
			.add_invitation(&tenant.id, "x@y.com", Some(&admin), None)
			.await
			.unwrap();
		assert!(lifecycle.accept(&invitation.id, &invitee).await.is_ok());
	}

	#[tokio::test]
	async fn foreign_invitation_is_forbidden() {
		let fx = directory_fixture().await;
		let lifecycle = InvitationLifecycle::new(fx.directory.clone());
		let admin = create_test_user(&fx.pool, "admin@example.com").await;
		let stranger = create_test_user(&fx.pool, "s@example.com").await;
		let tenant = fx.directory.create_tenant("Acme", &admin.id).await.unwrap();

		let invitation = fx
			.directory
			.add_invitation(&tenant.id, "x@y.com", Some(&admin), None)
			.await
			.unwrap();
		let result = lifecycle.accept(&invitation.id, &stranger).await;
		assert!(matches!(result, Err(TenancyError::Forbidden(_))));
	}

	#[tokio::test]
	async fn unverified_email_sees_no_invitations() {
		let fx = directory_fixture().await;
		let lifecycle = InvitationLifecycle::new(fx.directory.clone());
		let admin = create_test_user(&fx.pool, "admin@example.com").await;
		let tenant = fx.directory.create_tenant("Acme", &admin.id).await.unwrap();
		fx.directory
			.add_invitation(&tenant.id, "x@y.com", Some(&admin), None)
			.await
			.unwrap();

		let unverified = User::new("x@y.com", false);
		assert!(lifecycle.pending_for(&unverified).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn review_without_memberships_requires_an_acceptance() {
		let fx = directory_fixture().await;
		let lifecycle = InvitationLifecycle::new(fx.directory.clone());
		let admin = create_test_user(&fx.pool, "admin@example.com").await;
		let invitee = create_test_user(&fx.pool, "x@y.com").await;
		let t1 = fx.directory.create_tenant("Acme", &admin.id).await.unwrap();
		let t2 = fx.directory.create_tenant("Beta", &admin.id).await.unwrap();
		for tenant in [&t1, &t2] {
			fx.directory
				.add_invitation(&tenant.id, "x@y.com", Some(&admin), None)
				.await
				.unwrap();
		}

		let refused = lifecycle
			.review(&invitee, &BTreeSet::new(), &ids(&[t1.id, t2.id]))
			.await;
		assert!(matches!(refused, Err(TenancyError::Validation(_))));
		assert_eq!(lifecycle.pending_for(&invitee).await.unwrap().len(), 2);

		let outcome = lifecycle
			.review(&invitee, &ids(&[t1.id]), &BTreeSet::new())
			.await
			.unwrap();
		assert_eq!(outcome.accepted.len(), 1);
		assert_eq!(outcome.still_pending, 1);

		// With a membership in place, declining everything is allowed.
		let outcome = lifecycle
			.review(&invitee, &BTreeSet::new(), &ids(&[t2.id]))
			.await
			.unwrap();
		assert_eq!(outcome.rejected, vec![t2.id]);
		assert!(lifecycle.pending_for(&invitee).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn review_prefers_acceptance_and_ignores_unknown_ids() {
		let fx = directory_fixture().await;
		let lifecycle = InvitationLifecycle::new(fx.directory.clone());
		let admin = create_test_user(&fx.pool, "admin@example.com").await;
		let invitee = create_test_user(&fx.pool, "x@y.com").await;
		let tenant = fx.directory.create_tenant("Acme", &admin.id).await.unwrap();
		fx.directory
			.add_invitation(&tenant.id, "x@y.com", Some(&admin), None)
			.await
			.unwrap();

		let stray = TenantId::generate();
		let outcome = lifecycle
			.review(&invitee, &ids(&[tenant.id, stray]), &ids(&[tenant.id]))
			.await
			.unwrap();
		assert_eq!(outcome.accepted.len(), 1);
		assert!(outcome.rejected.is_empty());

		// Re-applying the same batch is a no-op.
		let again = lifecycle
			.review(&invitee, &ids(&[tenant.id]), &BTreeSet::new())
			.await
			.unwrap();
		assert_eq!(again, ReviewOutcome::default());
	}
}
