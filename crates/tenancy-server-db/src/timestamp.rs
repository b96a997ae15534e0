// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::DbError;

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>, DbError> {
	chrono::DateTime::parse_from_rfc3339(raw)
		.map(|ts| ts.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;

	#[test]
	fn formatted_timestamps_sort_chronologically() {
		let base = Utc::now();
		let later = base + Duration::microseconds(1);
		assert!(format_timestamp(base) < format_timestamp(later));
		assert_eq!(format_timestamp(base).len(), format_timestamp(later).len());
	}

	#[test]
	fn round_trips_to_microseconds() {
		let ts = Utc::now();
		let parsed = parse_timestamp(&format_timestamp(ts), "created_at").unwrap();
		assert_eq!(parsed.timestamp_micros(), ts.timestamp_micros());
	}
}
