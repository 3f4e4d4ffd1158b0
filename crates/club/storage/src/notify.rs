//! Notification delivery.
//!
//! Delivery is fire-and-forget from the ledger's point of view: a failed
//! notification is logged by the caller and never fails the operation that
//! produced it.

use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use club_types::{MemberId, Notification};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::info;

/// Sink for member-facing notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification) -> StorageResult<()>;
}

/// Sink that only emits a tracing event per notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn notify(&self, notification: Notification) -> StorageResult<()> {
        info!(
            member = %notification.member_id,
            title = %notification.title,
            message = %notification.message,
            "Notification"
        );
        Ok(())
    }
}

/// Sink that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct InMemoryNotificationSink {
    delivered: RwLock<Vec<Notification>>,
    failing: AtomicBool,
}

impl InMemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose deliveries all fail with `Unavailable`.
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn delivered_to(&self, member_id: &MemberId) -> Vec<Notification> {
        self.delivered()
            .into_iter()
            .filter(|n| &n.member_id == member_id)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn notify(&self, notification: Notification) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "notification channel offline".to_string(),
            ));
        }
        let mut guard = self
            .delivered
            .write()
            .map_err(|_| StorageError::Backend("notification lock poisoned".to_string()))?;
        guard.push(notification);
        Ok(())
    }
}
