// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory mirror of a subject verified by the identity host.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: UserId,
	/// Lower-cased address; unique within the directory.
	pub email: String,
	/// Only verified addresses are offered pending invitations at login.
	pub email_verified: bool,
	pub display_name: Option<String>,
	/// Realm administrators may manage every tenant.
	pub is_realm_admin: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl User {
	pub fn new(email: impl Into<String>, email_verified: bool) -> Self {
		let now = Utc::now();
		Self {
			id: UserId::generate(),
			email: email.into(),
			email_verified,
			display_name: None,
			is_realm_admin: false,
			created_at: now,
			updated_at: now,
		}
	}

	pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = Some(name.into());
		self
	}

	/// Name shown in notifications; falls back to the email address.
	pub fn label(&self) -> &str {
		self
			.display_name
			.as_deref()
			.filter(|n| !n.trim().is_empty())
			.unwrap_or(&self.email)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn label_prefers_display_name() {
		let user = User::new("a@b.com", true).with_display_name("Alice");
		assert_eq!(user.label(), "Alice");
	}

	#[test]
	fn label_falls_back_to_email() {
		let user = User::new("a@b.com", true).with_display_name("  ");
		assert_eq!(user.label(), "a@b.com");
	}
}
