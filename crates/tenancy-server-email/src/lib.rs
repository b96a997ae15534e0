// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Email delivery for tenant invitations.
//!
//! [`EmailNotifier`] implements the directory's `Notifier` on top of an
//! [`SmtpClient`]. Servers without SMTP configuration use the logging
//! notifier from `tenancy-server-auth` instead.

pub mod notifier;
pub mod smtp;
pub mod templates;

pub use notifier::EmailNotifier;
pub use smtp::{MailTransport, OutgoingEmail, SmtpClient, SmtpError};
pub use templates::{render, RenderedEmail};
