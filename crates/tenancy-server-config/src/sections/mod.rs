// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for tenancy-server.

pub mod auth;
pub mod database;
pub mod http;
pub mod identity_providers;
pub mod invitations;
pub mod logging;
pub mod smtp;

pub use auth::{AuthConfig, AuthConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use identity_providers::IdentityProvidersConfigLayer;
pub use invitations::{InvitationsConfig, InvitationsConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use smtp::{SmtpConfig, SmtpConfigLayer};
