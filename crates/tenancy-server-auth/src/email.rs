// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Email address normalization.
//!
//! Invitations and users are keyed by lower-cased email, so every address that
//! enters the directory goes through [`parse_email`].

use regex::Regex;
use std::sync::LazyLock;

use crate::error::TenancyError;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$")
		.expect("email regex is valid")
});

/// Maximum length of an email address (RFC 5321 path limit).
pub const MAX_EMAIL_LEN: usize = 254;

/// Trim whitespace and lowercase an email address.
pub fn normalize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

/// Returns true if the (already normalized) address is syntactically valid.
pub fn is_valid_email(email: &str) -> bool {
	email.len() <= MAX_EMAIL_LEN && EMAIL_REGEX.is_match(email)
}

/// Normalize and validate an email address.
///
/// # Errors
/// Returns `TenancyError::Validation` if the address is malformed.
pub fn parse_email(raw: &str) -> Result<String, TenancyError> {
	let email = normalize_email(raw);
	if email.is_empty() {
		return Err(TenancyError::Validation("email is required".to_string()));
	}
	if !is_valid_email(&email) {
		return Err(TenancyError::Validation(format!(
			"'{}' is not a valid email address",
			raw.trim()
		)));
	}
	Ok(email)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn lowercases_and_trims() {
		assert_eq!(parse_email("  X@Y.Com ").unwrap(), "x@y.com");
	}

	#[test]
	fn rejects_missing_at() {
		assert!(matches!(
			parse_email("not-an-email"),
			Err(TenancyError::Validation(_))
		));
	}

	#[test]
	fn rejects_missing_domain_dot() {
		assert!(parse_email("user@localhost").is_err());
	}

	#[test]
	fn rejects_blank() {
		assert!(parse_email("   ").is_err());
	}

	#[test]
	fn accepts_plus_addressing() {
		assert_eq!(
			parse_email("first.last+tag@sub.example.org").unwrap(),
			"first.last+tag@sub.example.org"
		);
	}

	proptest! {
		#[test]
		fn normalization_is_idempotent(email in "[A-Za-z0-9._]{1,20}@[A-Za-z]{1,10}\\.[A-Za-z]{2,4}") {
			let once = normalize_email(&email);
			prop_assert_eq!(normalize_email(&once), once.clone());
			prop_assert!(is_valid_email(&once));
		}

		#[test]
		fn case_variants_normalize_equal(local in "[a-z]{1,10}", domain in "[a-z]{1,10}") {
			let lower = format!("{local}@{domain}.com");
			let upper = lower.to_uppercase();
			prop_assert_eq!(parse_email(&upper).unwrap(), parse_email(&lower).unwrap());
		}
	}
}
