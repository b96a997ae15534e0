// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Embedded schema migrations.

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
	(
		"001_create_users",
		include_str!("../migrations/001_create_users.sql"),
	),
	(
		"002_create_tenants",
		include_str!("../migrations/002_create_tenants.sql"),
	),
	(
		"003_create_memberships",
		include_str!("../migrations/003_create_memberships.sql"),
	),
];

/// Split a migration file into executable statements, dropping comment lines.
fn statements(sql: &str) -> Vec<String> {
	let stripped = sql
		.lines()
		.filter(|line| !line.trim_start().starts_with("--"))
		.collect::<Vec<_>>()
		.join("\n");
	stripped
		.split(';')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_string)
		.collect()
}

/// Apply all migrations. Every statement is idempotent.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		for stmt in statements(sql) {
			sqlx::query(&stmt).execute(pool).await?;
		}
		tracing::debug!(migration = name, "migration applied");
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	#[test]
	fn comment_lines_are_dropped() {
		let sql = "-- a; b\nCREATE TABLE x (id TEXT);\n\n-- trailing\n";
		let stmts = statements(sql);
		assert_eq!(stmts, vec!["CREATE TABLE x (id TEXT)".to_string()]);
	}

	#[tokio::test]
	async fn migrations_are_idempotent() {
		let pool = create_test_pool().await;
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let tables: Vec<String> = sqlx::query_scalar(
			"SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'tenant%' ORDER BY name",
		)
		.fetch_all(&pool)
		.await
		.unwrap();
		assert_eq!(
			tables,
			vec![
				"tenant_attributes",
				"tenant_invitations",
				"tenant_membership_roles",
				"tenant_memberships",
				"tenants",
			]
		);
	}
}
