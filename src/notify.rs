use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedNotification {
    pub id: u64,
    #[serde(flatten)]
    pub notification: Notification,
}

/// Keeps the most recent notifications for the page to pick up as toasts.
#[derive(Debug)]
pub struct NotificationQueue {
    capacity: usize,
    inner: Mutex<QueueInner>,
}

#[derive(Debug, Default)]
struct QueueInner {
    next_id: u64,
    items: VecDeque<QueuedNotification>,
}

impl NotificationQueue {
    pub const DEFAULT_CAPACITY: usize = 32;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(QueueInner {
                next_id: 1,
                items: VecDeque::new(),
            }),
        }
    }

    /// Everything queued with an id greater than `after`, oldest first.
    pub fn since(&self, after: u64) -> Vec<QueuedNotification> {
        self.lock()
            .items
            .iter()
            .filter(|item| item.id > after)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl NotificationSink for NotificationQueue {
    fn notify(&self, notification: Notification) {
        info!(title = %notification.title, "{}", notification.description);
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.items.push_back(QueuedNotification { id, notification });
        while inner.items.len() > self.capacity {
            inner.items.pop_front();
        }
    }
}
