//! Day-scoped walk counter.
//!
//! `CounterState` is a value: every transition takes the current state and
//! returns the next one along with the event it produced, if any. Nothing in
//! here touches storage or the clock.
//!
//! ```text
//! Active(count < cap) --increment--> Active | Complete
//! Complete            --increment--> Complete (no-op)
//! any                 --reset------> Active(0)
//! ```

use crate::clock::{date_key, time_key};
use crate::notify::Notification;
use crate::storage::PersistedRecord;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub const DEFAULT_CAP: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterEvent {
    Progress { count: u32, cap: u32 },
    GoalReached { cap: u32 },
    DayReset { date: NaiveDate },
}

impl CounterEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::GoalReached { .. } => "goal-reached",
            Self::DayReset { .. } => "day-reset",
        }
    }

    pub fn notification(&self) -> Notification {
        match self {
            Self::Progress { count, cap } => Notification::new(
                "Walk Completed!",
                format!("{count}/{cap} walks done today"),
            ),
            Self::GoalReached { .. } => Notification::new(
                "🎉 Daily Goal Achieved!",
                "Your dog completed all walks for today!",
            ),
            Self::DayReset { .. } => Notification::new(
                "🌅 New Day Started!",
                "Walk tracker has been reset for today",
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterState {
    count: u32,
    cap: u32,
    last_walk_at: Option<NaiveDateTime>,
    owner_date: NaiveDate,
}

impl CounterState {
    /// A zeroed counter owned by `owner_date`. The cap is at least 1.
    pub fn fresh(owner_date: NaiveDate, cap: u32) -> Self {
        Self {
            count: 0,
            cap: cap.max(1),
            last_walk_at: None,
            owner_date,
        }
    }

    /// Builds the session state from whatever was persisted.
    ///
    /// A record owned by `today` is adopted. Anything else, including no record
    /// or one counting past the cap, starts a fresh day and reports it as a
    /// reset so the caller writes the new day through.
    pub fn initialize(
        persisted: Option<&PersistedRecord>,
        today: NaiveDate,
        cap: u32,
    ) -> (Self, Option<CounterEvent>) {
        let fresh = Self::fresh(today, cap);

        if let Some(record) = persisted {
            if record.owner_date == date_key(today) && record.count <= fresh.cap {
                let last_walk_at = record
                    .last_walk_time
                    .as_deref()
                    .and_then(|time| NaiveTime::parse_from_str(time, "%H:%M:%S").ok())
                    .map(|time| today.and_time(time));
                let adopted = Self {
                    count: record.count,
                    last_walk_at,
                    ..fresh
                };
                return (adopted, None);
            }
        }

        let (state, event) = fresh.reset(today);
        (state, Some(event))
    }

    /// Counts one walk. At the cap this is a no-op and yields no event.
    pub fn increment(&self, now: NaiveDateTime) -> (Self, Option<CounterEvent>) {
        if self.count >= self.cap {
            return (self.clone(), None);
        }

        let count = self.count + 1;
        let next = Self {
            count,
            last_walk_at: Some(now),
            ..self.clone()
        };
        let event = if count == self.cap {
            CounterEvent::GoalReached { cap: self.cap }
        } else {
            CounterEvent::Progress {
                count,
                cap: self.cap,
            }
        };
        (next, Some(event))
    }

    pub fn reset(&self, today: NaiveDate) -> (Self, CounterEvent) {
        (
            Self::fresh(today, self.cap),
            CounterEvent::DayReset { date: today },
        )
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn owner_date(&self) -> NaiveDate {
        self.owner_date
    }

    pub fn last_walk_at(&self) -> Option<NaiveDateTime> {
        self.last_walk_at
    }

    pub fn phase(&self) -> Phase {
        if self.count >= self.cap {
            Phase::Complete
        } else {
            Phase::Active
        }
    }

    pub fn progress_fraction(&self) -> f64 {
        f64::from(self.count) / f64::from(self.cap)
    }

    /// 0..=100, rounded.
    pub fn progress_percent(&self) -> u32 {
        (self.progress_fraction() * 100.0).round() as u32
    }

    pub fn to_record(&self) -> PersistedRecord {
        PersistedRecord {
            count: self.count,
            owner_date: date_key(self.owner_date),
            last_walk_time: self.last_walk_at.map(time_key),
        }
    }
}
