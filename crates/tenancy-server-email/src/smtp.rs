// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMTP transport built on [`lettre`].

use async_trait::async_trait;
use lettre::{
	message::{header::ContentType, Mailbox, MultiPart, SinglePart},
	transport::smtp::authentication::Credentials,
	AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tenancy_server_config::SmtpConfig;

#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
	#[error("connection failed: {0}")]
	Connection(String),

	#[error("send failed: {0}")]
	Send(String),

	#[error("invalid email address: {0}")]
	Address(String),
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
	pub to: String,
	pub subject: String,
	pub html: String,
	pub text: String,
}

/// Something that can deliver an [`OutgoingEmail`].
#[async_trait]
pub trait MailTransport: Send + Sync {
	async fn send(&self, email: OutgoingEmail) -> Result<(), SmtpError>;
}

/// Async SMTP client. Connections are opened lazily when sending.
pub struct SmtpClient {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from_mailbox: Mailbox,
}

impl SmtpClient {
	#[tracing::instrument(
		name = "smtp_client_new",
		skip(config),
		fields(host = %config.host, port = %config.port, use_tls = %config.use_tls)
	)]
	pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
		let from_mailbox: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
			.parse()
			.map_err(|e| SmtpError::Address(format!("{e}")))?;

		let builder = if config.use_tls {
			AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
				.map_err(|e| SmtpError::Connection(format!("{e}")))?
		} else {
			AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
		};

		let mut builder = builder.port(config.port);
		if let (Some(username), Some(password)) = (&config.username, &config.password) {
			builder = builder.credentials(Credentials::new(
				username.clone(),
				password.expose().to_string(),
			));
		}

		tracing::debug!("SMTP client initialized");
		Ok(Self {
			transport: builder.build(),
			from_mailbox,
		})
	}

	/// Open a connection to the server and close it again.
	#[tracing::instrument(name = "smtp_check_health", skip(self))]
	pub async fn check_health(&self) -> Result<(), SmtpError> {
		let reachable = self
			.transport
			.test_connection()
			.await
			.map_err(|e| SmtpError::Connection(format!("{e}")))?;
		if !reachable {
			return Err(SmtpError::Connection("server did not respond".to_string()));
		}
		Ok(())
	}

	fn build_message(&self, email: &OutgoingEmail) -> Result<Message, SmtpError> {
		let to_mailbox: Mailbox = email
			.to
			.parse()
			.map_err(|e| SmtpError::Address(format!("{e}")))?;

		Message::builder()
			.from(self.from_mailbox.clone())
			.to(to_mailbox)
			.subject(email.subject.as_str())
			.multipart(
				MultiPart::alternative()
					.singlepart(
						SinglePart::builder()
							.header(ContentType::TEXT_PLAIN)
							.body(email.text.clone()),
					)
					.singlepart(
						SinglePart::builder()
							.header(ContentType::TEXT_HTML)
							.body(email.html.clone()),
					),
			)
			.map_err(|e| SmtpError::Send(format!("failed to build message: {e}")))
	}
}

#[async_trait]
impl MailTransport for SmtpClient {
	#[tracing::instrument(
		name = "smtp_send_email",
		skip(self, email),
		fields(to = %email.to, subject = %email.subject)
	)]
	async fn send(&self, email: OutgoingEmail) -> Result<(), SmtpError> {
		let message = self.build_message(&email)?;
		self.transport
			.send(message)
			.await
			.map_err(|e| SmtpError::Send(format!("{e}")))?;
		tracing::debug!("email sent");
		Ok(())
	}
}
