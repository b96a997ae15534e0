// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Path and form parameter parsing.

use std::collections::BTreeSet;
use std::str::FromStr;
use tenancy_server_auth::{InvitationId, MembershipId, TenancyError, TenantId, UserSessionId};

fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, TenancyError> {
	raw
		.trim()
		.parse()
		.map_err(|_| TenancyError::Validation(format!("invalid {what} id '{}'", raw.trim())))
}

pub fn parse_tenant_id(raw: &str) -> Result<TenantId, TenancyError> {
	parse_id(raw, "tenant")
}

pub fn parse_membership_id(raw: &str) -> Result<MembershipId, TenancyError> {
	parse_id(raw, "membership")
}

pub fn parse_invitation_id(raw: &str) -> Result<InvitationId, TenancyError> {
	parse_id(raw, "invitation")
}

pub fn parse_user_session_id(raw: &str) -> Result<UserSessionId, TenancyError> {
	parse_id(raw, "user session")
}

/// Parse a comma-separated list of tenant ids. Blank entries are skipped.
pub fn parse_tenant_id_list(raw: &str) -> Result<BTreeSet<TenantId>, TenancyError> {
	raw
		.split(',')
		.map(str::trim)
		.filter(|entry| !entry.is_empty())
		.map(parse_tenant_id)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn id_list_skips_blanks() {
		let a = TenantId::generate();
		let b = TenantId::generate();
		let parsed = parse_tenant_id_list(&format!(" {a}, ,{b},")).unwrap();
		assert_eq!(parsed, [a, b].into_iter().collect());
		assert!(parse_tenant_id_list("").unwrap().is_empty());
	}

	#[test]
	fn id_list_rejects_garbage() {
		let err = parse_tenant_id_list("abc").unwrap_err();
		assert!(matches!(err, TenancyError::Validation(_)));
	}

	proptest! {
		#[test]
		fn list_round_trips(count in 0..8usize) {
			let ids: BTreeSet<TenantId> = (0..count).map(|_| TenantId::generate()).collect();
			let raw = ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
			prop_assert_eq!(parse_tenant_id_list(&raw).unwrap(), ids);
		}
	}
}
