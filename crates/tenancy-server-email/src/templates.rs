// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subject, HTML and plain-text bodies for tenant notifications.

use tenancy_server_auth::{InvitationOutcome, TenantNotification};

/// A rendered notification without a recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
	pub subject: String,
	pub html: String,
	pub text: String,
}

/// Render `notification`. `base_url` is where the invitee signs in.
pub fn render(notification: &TenantNotification, base_url: &str) -> RenderedEmail {
	match notification {
		TenantNotification::Invited {
			tenant_name,
			inviter_name,
			roles,
		} => {
			let subject = format!("You've been invited to join {tenant_name}");
			let lead = match inviter_name {
				Some(inviter) => format!("{inviter} invited you to join {tenant_name}."),
				None => format!("You have been invited to join {tenant_name}."),
			};
			let roles = if roles.is_empty() {
				String::new()
			} else {
				format!(
					"You will be granted: {}.",
					roles.iter().cloned().collect::<Vec<_>>().join(", ")
				)
			};
			let action = "Sign in to review the invitation.";
			let link = format!("{}/login/tenant", base_url.trim_end_matches('/'));

			let text = [lead.as_str(), roles.as_str(), action, link.as_str()]
				.into_iter()
				.filter(|line| !line.is_empty())
				.collect::<Vec<_>>()
				.join("\n\n");
			let html = page(
				&subject,
				&format!(
					"<p>{}</p>{}<p><a href=\"{link}\">{action}</a></p>",
					escape(&lead),
					if roles.is_empty() {
						String::new()
					} else {
						format!("<p>{}</p>", escape(&roles))
					},
					link = escape(&link),
				),
			);

			RenderedEmail { subject, html, text }
		}
		TenantNotification::InvitationAnswered {
			tenant_name,
			invitee_email,
			outcome,
		} => {
			let verb = match outcome {
				InvitationOutcome::Accepted => "accepted",
				InvitationOutcome::Rejected => "declined",
			};
			let subject = format!("{invitee_email} {verb} your invitation to {tenant_name}");
			let text = format!("{invitee_email} has {verb} your invitation to join {tenant_name}.");
			let html = page(&subject, &format!("<p>{}</p>", escape(&text)));
			RenderedEmail { subject, html, text }
		}
	}
}

fn page(title: &str, body: &str) -> String {
	format!(
		r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #1a1a1a; font-size: 22px;">{title}</h1>
    {body}
</body>
</html>"#,
		title = escape(title),
	)
}

fn escape(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	for c in raw.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}
	out
}
