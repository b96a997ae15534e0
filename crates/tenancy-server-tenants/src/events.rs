// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory lifecycle events.

use async_trait::async_trait;
use serde::Serialize;
use tenancy_server_auth::{TenantId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectoryEvent {
	TenantCreated {
		tenant_id: TenantId,
		name: String,
		creator: UserId,
	},
	TenantDeleted {
		tenant_id: TenantId,
	},
}

impl DirectoryEvent {
	pub fn name(&self) -> &'static str {
		match self {
			DirectoryEvent::TenantCreated { .. } => "tenant_created",
			DirectoryEvent::TenantDeleted { .. } => "tenant_deleted",
		}
	}

	pub fn tenant_id(&self) -> TenantId {
		match self {
			DirectoryEvent::TenantCreated { tenant_id, .. }
			| DirectoryEvent::TenantDeleted { tenant_id } => *tenant_id,
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum EventSinkError {
	#[error("transient failure: {0}")]
	Transient(String),

	#[error("permanent failure: {0}")]
	Permanent(String),
}

/// Receives directory events after the triggering mutation has committed.
#[async_trait]
pub trait EventSink: Send + Sync {
	fn name(&self) -> &str;

	async fn publish(&self, event: &DirectoryEvent) -> Result<(), EventSinkError>;
}

/// Sink that records events in the log stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
	fn name(&self) -> &str {
		"tracing"
	}

	async fn publish(&self, event: &DirectoryEvent) -> Result<(), EventSinkError> {
		tracing::info!(event = event.name(), tenant_id = %event.tenant_id(), "directory event");
		Ok(())
	}
}
