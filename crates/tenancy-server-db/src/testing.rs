// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory database helpers for tests in this and dependent crates.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use tenancy_server_auth::User;

use crate::migrate::run_migrations;
use crate::user::UserRepository;

/// Single-connection in-memory pool. Every connection to `:memory:` is a
/// separate database, so the pool must never open a second one.
pub async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str(":memory:")
		.unwrap()
		.foreign_keys(true);

	SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await
		.expect("Failed to create test pool")
}

/// In-memory pool with the full schema applied.
pub async fn create_tenancy_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	run_migrations(&pool).await.unwrap();
	pool
}

/// Insert a verified user with the given email.
pub async fn create_test_user(pool: &SqlitePool, email: &str) -> User {
	UserRepository::new(pool.clone())
		.upsert_user(&User::new(email, true))
		.await
		.unwrap()
}
