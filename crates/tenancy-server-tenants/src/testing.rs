// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tenancy_server_auth::{Notifier, NotifyError, TenantNotification};
use tenancy_server_db::testing::create_tenancy_test_pool;
use tenancy_server_db::{TenantRepository, TenantStore, UserRepository, UserStore};

use crate::directory::TenantDirectory;
use crate::events::{DirectoryEvent, EventSink, EventSinkError};

pub const REALM: &str = "test-realm";

pub struct DirectoryFixture {
	pub pool: SqlitePool,
	pub tenants: Arc<dyn TenantStore>,
	pub users: Arc<dyn UserStore>,
	pub directory: TenantDirectory,
}

pub async fn directory_fixture() -> DirectoryFixture {
	let pool = create_tenancy_test_pool().await;
	let tenants: Arc<dyn TenantStore> = Arc::new(TenantRepository::new(pool.clone()));
	let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(pool.clone()));
	let directory = TenantDirectory::new(tenants.clone(), users.clone(), REALM);
	DirectoryFixture {
		pool,
		tenants,
		users,
		directory,
	}
}

#[derive(Default)]
pub struct RecordingNotifier {
	sent: Mutex<Vec<(String, TenantNotification)>>,
}

impl RecordingNotifier {
	pub fn sent(&self) -> Vec<(String, TenantNotification)> {
		self.sent.lock().unwrap().clone()
	}

	/// Notifications are delivered on spawned tasks; poll until `count` arrived.
	pub async fn wait_for(&self, count: usize) {
		for _ in 0..100 {
			if self.sent.lock().unwrap().len() >= count {
				return;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		panic!("expected {count} notifications, got {}", self.sent().len());
	}
}

#[async_trait]
impl Notifier for RecordingNotifier {
	async fn notify(&self, to: &str, notification: TenantNotification) -> Result<(), NotifyError> {
		self
			.sent
			.lock()
			.unwrap()
			.push((to.to_string(), notification));
		Ok(())
	}
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
	async fn notify(&self, _to: &str, _notification: TenantNotification) -> Result<(), NotifyError> {
		Err(NotifyError::Delivery("smtp unreachable".to_string()))
	}
}

#[derive(Default)]
pub struct RecordingSink {
	events: Mutex<Vec<DirectoryEvent>>,
}

impl RecordingSink {
	pub fn events(&self) -> Vec<DirectoryEvent> {
		self.events.lock().unwrap().clone()
	}
}

#[async_trait]
impl EventSink for RecordingSink {
	fn name(&self) -> &str {
		"recording"
	}

	async fn publish(&self, event: &DirectoryEvent) -> Result<(), EventSinkError> {
		self.events.lock().unwrap().push(event.clone());
		Ok(())
	}
}
