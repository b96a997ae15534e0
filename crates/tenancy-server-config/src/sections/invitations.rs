// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Invitation lifetime.

use serde::Deserialize;

#[derive(Debug, Clone, Default)]
pub struct InvitationsConfig {
	/// Days before a pending invitation lapses. `None` keeps invitations
	/// until they are answered or revoked.
	pub expiry_days: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvitationsConfigLayer {
	#[serde(default)]
	pub expiry_days: Option<u32>,
}

impl InvitationsConfigLayer {
	pub fn merge(&mut self, other: InvitationsConfigLayer) {
		if other.expiry_days.is_some() {
			self.expiry_days = other.expiry_days;
		}
	}

	pub fn finalize(self) -> InvitationsConfig {
		InvitationsConfig {
			expiry_days: self.expiry_days.filter(|days| *days > 0),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_days_disables_expiry() {
		let config = InvitationsConfigLayer {
			expiry_days: Some(0),
		}
		.finalize();
		assert_eq!(config.expiry_days, None);

		let config = InvitationsConfigLayer {
			expiry_days: Some(7),
		}
		.finalize();
		assert_eq!(config.expiry_days, Some(7));
	}
}
