use crate::notify::NotificationQueue;
use crate::tracker::DailyCounterStore;
use crate::watchdog::SharedTracker;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub tracker: SharedTracker,
    pub notifications: Arc<NotificationQueue>,
}

impl AppState {
    pub fn new(tracker: DailyCounterStore, notifications: Arc<NotificationQueue>) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            notifications,
        }
    }
}
