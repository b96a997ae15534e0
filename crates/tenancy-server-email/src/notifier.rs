// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use std::sync::Arc;
use tenancy_server_auth::{is_valid_email, normalize_email, Notifier, NotifyError, TenantNotification};

use crate::smtp::{MailTransport, OutgoingEmail, SmtpError};
use crate::templates::render;

/// [`Notifier`] that renders notifications and hands them to a [`MailTransport`].
pub struct EmailNotifier {
	transport: Arc<dyn MailTransport>,
	base_url: String,
}

impl EmailNotifier {
	pub fn new(transport: Arc<dyn MailTransport>, base_url: impl Into<String>) -> Self {
		Self {
			transport,
			base_url: base_url.into(),
		}
	}
}

#[async_trait]
impl Notifier for EmailNotifier {
	#[tracing::instrument(name = "email_notify", skip(self, notification), fields(to = %to, kind = notification.kind()))]
	async fn notify(&self, to: &str, notification: TenantNotification) -> Result<(), NotifyError> {
		let to = normalize_email(to);
		if !is_valid_email(&to) {
			return Err(NotifyError::Recipient(to));
		}

		let rendered = render(&notification, &self.base_url);
		self.transport
			.send(OutgoingEmail {
				to,
				subject: rendered.subject,
				html: rendered.html,
				text: rendered.text,
			})
			.await
			.map_err(|e| match e {
				SmtpError::Address(msg) => NotifyError::Recipient(msg),
				other => NotifyError::Delivery(other.to_string()),
			})
	}
}
