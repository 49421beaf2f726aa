use crate::clock::{format_countdown, Clock};
use crate::counter::{CounterEvent, CounterState};
use crate::notify::NotificationSink;
use crate::storage::{PersistenceAdapter, RECORD_KEYS};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a fine-cadence check saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FineCheck {
    Idle,
    NearMidnight,
    RolledOver,
}

/// The session's walk counter bound to its collaborators.
///
/// All transitions go through here: the state is replaced, the store gets
/// the new record, the sink gets the notification.
pub struct DailyCounterStore {
    state: CounterState,
    storage: Box<dyn PersistenceAdapter>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    near_midnight: Duration,
    next_reset_in: String,
}

impl DailyCounterStore {
    pub fn open(
        mut storage: Box<dyn PersistenceAdapter>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        cap: u32,
    ) -> Self {
        let now = clock.now();
        let persisted = match storage.load() {
            Ok(record) => record,
            Err(err) => {
                warn!("ignoring stored walk progress: {err}");
                if let Err(err) = storage.clear(&RECORD_KEYS) {
                    warn!("failed to clear stored walk progress: {err}");
                }
                None
            }
        };

        let (state, event) = CounterState::initialize(persisted.as_ref(), now.date(), cap);
        let mut store = Self {
            state,
            storage,
            sink,
            clock,
            near_midnight: Duration::minutes(2),
            next_reset_in: String::new(),
        };

        match event {
            Some(CounterEvent::DayReset { date }) => store.start_day(date),
            _ => info!(
                count = store.state.count(),
                cap = store.state.cap(),
                "resumed today's walk progress"
            ),
        }
        store.refresh_countdown();
        store
    }

    pub fn with_near_midnight(mut self, window: Duration) -> Self {
        self.near_midnight = window;
        self
    }

    pub fn state(&self) -> &CounterState {
        &self.state
    }

    pub fn next_reset_in(&self) -> &str {
        &self.next_reset_in
    }

    /// Records a walk now. A day boundary the watchdog has not seen yet is
    /// applied first. Returns `None` when the day is already complete.
    pub fn complete_walk(&mut self) -> Option<CounterEvent> {
        let now = self.clock.now();
        if self.rollover_if_due(now) {
            self.refresh_countdown();
        }

        let (next, event) = self.state.increment(now);
        let event = event?;
        self.state = next;
        self.persist();
        self.sink.notify(event.notification());
        debug!(kind = event.kind(), count = self.state.count(), "walk recorded");
        Some(event)
    }

    /// Date comparison against the owning day. Returns whether it reset.
    pub fn coarse_check(&mut self) -> bool {
        let now = self.clock.now();
        let rolled = self.rollover_if_due(now);
        self.refresh_countdown();
        rolled
    }

    /// Countdown to the midnight ending the owning day; resets once it has
    /// run out.
    pub fn fine_check(&mut self) -> FineCheck {
        let remaining = self.clock.until_rollover(self.state.owner_date());
        // Read after the countdown so a run-out countdown always sees the new date.
        let now = self.clock.now();

        let outcome = if remaining <= Duration::zero() {
            if self.rollover_if_due(now) {
                FineCheck::RolledOver
            } else {
                FineCheck::Idle
            }
        } else if remaining < self.near_midnight {
            debug!(seconds = remaining.num_seconds(), "approaching midnight");
            FineCheck::NearMidnight
        } else {
            FineCheck::Idle
        };

        self.refresh_countdown();
        outcome
    }

    fn rollover_if_due(&mut self, now: NaiveDateTime) -> bool {
        if self.state.owner_date() == now.date() {
            return false;
        }
        self.start_day(now.date());
        true
    }

    /// The single reset path shared by startup and both watchdog cadences.
    fn start_day(&mut self, date: NaiveDate) {
        let (state, event) = self.state.reset(date);
        self.state = state;
        self.persist();
        info!(%date, "walk tracker reset for the new day");
        self.sink.notify(event.notification());
    }

    fn persist(&mut self) {
        if let Err(err) = self.storage.save(&self.state.to_record()) {
            warn!("failed to persist walk progress: {err}");
        }
    }

    fn refresh_countdown(&mut self) {
        let remaining = self.clock.until_rollover(self.state.owner_date());
        self.next_reset_in = format_countdown(remaining);
    }
}
