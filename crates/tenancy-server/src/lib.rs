// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP server for the multi-tenant directory.
//!
//! The router exposes tenant administration, the login-time tenant
//! resolution screens and the hand-off endpoint used by the identity host.

pub mod api;
pub mod api_docs;
pub mod api_response;
pub mod auth_middleware;
pub mod pagination;
pub mod routes;
pub mod tokens;
pub mod validation;

pub use api::{create_app_state, create_router, AppState};
pub use tenancy_server_config::ServerConfig;
