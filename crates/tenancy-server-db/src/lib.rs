// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database layer for the tenancy server.
//!
//! This crate provides:
//! - Connection pooling ([`create_pool`]) and embedded migrations
//!   ([`run_migrations`])
//! - The [`TenantStore`] repository over tenants, attributes, memberships and
//!   invitations
//! - The [`UserStore`] mirror of identity-host subjects
//! - [`DbError`], which maps constraint violations onto domain errors

pub mod error;
pub mod migrate;
pub mod pool;
pub mod tenant;
pub mod testing;
mod timestamp;
pub mod user;

pub use error::{DbError, Result};
pub use migrate::run_migrations;
pub use pool::create_pool;
pub use tenant::{TenantQuery, TenantRepository, TenantStore, LONG_VALUE_THRESHOLD};
pub use user::{UserRepository, UserStore};
