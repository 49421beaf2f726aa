use crate::clock::{date_key, time_key};
use crate::counter::Phase;
use crate::notify::{Notification, QueuedNotification};
use crate::tracker::DailyCounterStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkSnapshot {
    pub date: String,
    pub count: u32,
    pub cap: u32,
    pub progress_percent: u32,
    pub complete: bool,
    pub last_walk_time: Option<String>,
    pub next_reset_in: String,
}

impl WalkSnapshot {
    pub fn of(store: &DailyCounterStore) -> Self {
        let state = store.state();
        Self {
            date: date_key(state.owner_date()),
            count: state.count(),
            cap: state.cap(),
            progress_percent: state.progress_percent(),
            complete: state.phase() == Phase::Complete,
            last_walk_time: state.last_walk_at().map(time_key),
            next_reset_in: store.next_reset_in().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalkResponse {
    pub today: WalkSnapshot,
    pub accepted: bool,
    pub notification: Option<Notification>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    #[serde(default)]
    pub after: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<QueuedNotification>,
}
