// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outbound notifications triggered by invitation changes.
//!
//! Delivery is best effort: callers dispatch notifications after the directory
//! mutation has committed and only log failures.

use async_trait::async_trait;
use std::fmt;

use crate::types::{InvitationOutcome, RoleSet};

/// A notification about a tenant invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantNotification {
	/// Sent to the invitee when an invitation is created.
	Invited {
		tenant_name: String,
		inviter_name: Option<String>,
		roles: RoleSet,
	},
	/// Sent to the inviter when the invitee accepts or declines.
	InvitationAnswered {
		tenant_name: String,
		invitee_email: String,
		outcome: InvitationOutcome,
	},
}

impl TenantNotification {
	/// Short name used in logs.
	pub fn kind(&self) -> &'static str {
		match self {
			TenantNotification::Invited { .. } => "invited",
			TenantNotification::InvitationAnswered {
				outcome: InvitationOutcome::Accepted,
				..
			} => "invitation_accepted",
			TenantNotification::InvitationAnswered {
				outcome: InvitationOutcome::Rejected,
				..
			} => "invitation_declined",
		}
	}
}

impl fmt::Display for TenantNotification {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.kind())
	}
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
	#[error("invalid recipient: {0}")]
	Recipient(String),

	#[error("delivery failed: {0}")]
	Delivery(String),
}

/// Delivers [`TenantNotification`]s to an email address.
#[async_trait]
pub trait Notifier: Send + Sync {
	async fn notify(&self, to: &str, notification: TenantNotification) -> Result<(), NotifyError>;
}

/// Notifier used when no mail transport is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
	async fn notify(&self, to: &str, notification: TenantNotification) -> Result<(), NotifyError> {
		tracing::info!(to = %to, kind = notification.kind(), "notification not delivered, no transport configured");
		Ok(())
	}
}
