// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use tenancy_server_auth::{Notifier, TenantNotification};
use tracing::warn;

/// Deliver a notification on a spawned task. Failures are logged and dropped.
pub(crate) fn dispatch(notifier: &Arc<dyn Notifier>, to: String, notification: TenantNotification) {
	let notifier = Arc::clone(notifier);
	tokio::spawn(async move {
		let kind = notification.kind();
		match notifier.notify(&to, notification).await {
			Ok(()) => tracing::debug!(to = %to, kind, "notification delivered"),
			Err(e) => warn!(to = %to, kind, error = %e, "notification delivery failed"),
		}
	});
}
