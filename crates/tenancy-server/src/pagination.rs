// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `first`/`max` paging shared by list handlers.

pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Clamp `first`/`max` into an `(offset, limit)` pair.
pub fn offset_limit(first: Option<i64>, max: Option<i64>) -> (i64, i64) {
	let offset = first.unwrap_or(0).max(0);
	let limit = max.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
	(offset, limit)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		assert_eq!(offset_limit(None, None), (0, DEFAULT_PAGE_SIZE));
	}

	#[test]
	fn clamping() {
		assert_eq!(offset_limit(Some(-5), Some(5000)), (0, MAX_PAGE_SIZE));
		assert_eq!(offset_limit(Some(10), Some(0)), (10, 1));
	}
}
