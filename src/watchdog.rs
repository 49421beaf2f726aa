//! Background rollover detection.
//!
//! One task, two cadences: a coarse date comparison and a fine countdown
//! check. Every tick locks the shared store and works on the live state, so
//! whichever cadence fires first after midnight does the reset and the other
//! finds nothing to do.

use crate::tracker::{DailyCounterStore, FineCheck};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{oneshot, Mutex},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

pub type SharedTracker = Arc<Mutex<DailyCounterStore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogConfig {
    pub coarse: Duration,
    pub fine: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            coarse: Duration::from_secs(60),
            fine: Duration::from_secs(10),
        }
    }
}

/// Owns the running watchdog. Dropping it aborts the task.
pub struct WatchdogHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl WatchdogHandle {
    /// Stops the task and waits for it to finish its current tick.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for WatchdogHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub fn spawn(tracker: SharedTracker, config: WatchdogConfig) -> WatchdogHandle {
    let (tx, rx) = oneshot::channel();
    let task = tokio::spawn(run(tracker, config, rx));
    WatchdogHandle {
        shutdown: Some(tx),
        task: Some(task),
    }
}

async fn run(tracker: SharedTracker, config: WatchdogConfig, mut shutdown: oneshot::Receiver<()>) {
    let start = Instant::now();
    let mut coarse = interval_at(start + config.coarse, config.coarse);
    let mut fine = interval_at(start + config.fine, config.fine);
    coarse.set_missed_tick_behavior(MissedTickBehavior::Delay);
    fine.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        coarse_secs = config.coarse.as_secs(),
        fine_secs = config.fine.as_secs(),
        "rollover watchdog started"
    );

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = coarse.tick() => {
                if tracker.lock().await.coarse_check() {
                    debug!("coarse check rolled the day over");
                }
            }
            _ = fine.tick() => {
                if tracker.lock().await.fine_check() == FineCheck::RolledOver {
                    debug!("fine check rolled the day over");
                }
            }
        }
    }

    info!("rollover watchdog stopped");
}
