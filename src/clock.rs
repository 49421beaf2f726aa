use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// Real time left until the midnight that ends `date`, negative once it
    /// has passed.
    fn until_rollover(&self, date: NaiveDate) -> Duration;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn until_rollover(&self, date: NaiveDate) -> Duration {
        time_until_rollover(date, &Local::now())
    }
}

/// Clock that only moves when told to. Runs in UTC unless built with
/// [`ManualClock::in_zone`].
#[derive(Clone)]
pub struct ManualClock<Tz: TimeZone = Utc> {
    zone: Tz,
    now: Arc<Mutex<DateTime<Tz>>>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self::in_zone(Utc, now)
    }
}

impl<Tz: TimeZone> ManualClock<Tz> {
    pub fn in_zone(zone: Tz, now: NaiveDateTime) -> Self {
        let now = resolve_local(&zone, now);
        Self {
            zone,
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        let now = resolve_local(&self.zone, now);
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = guard.clone() + by;
    }

    fn current(&self) -> DateTime<Tz> {
        self.now
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl<Tz> Clock for ManualClock<Tz>
where
    Tz: TimeZone + Send + Sync,
    Tz::Offset: Send + Sync,
{
    fn now(&self) -> NaiveDateTime {
        self.current().naive_local()
    }

    fn until_rollover(&self, date: NaiveDate) -> Duration {
        time_until_rollover(date, &self.current())
    }
}

/// Places a wall-clock time in `zone`. Times skipped by a forward shift move
/// past the gap.
fn resolve_local<Tz: TimeZone>(zone: &Tz, local: NaiveDateTime) -> DateTime<Tz> {
    zone.from_local_datetime(&local)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .unwrap_or_else(|| zone.from_utc_datetime(&local))
}

/// The midnight that ends `date`, as a wall-clock time.
pub fn midnight_after(date: NaiveDate) -> NaiveDateTime {
    let next = date.succ_opt().unwrap_or(NaiveDate::MAX);
    next.and_time(NaiveTime::MIN)
}

/// Elapsed time from `now` to the midnight ending `date` in `now`'s zone.
/// Days with a clock shift are shorter or longer than 24 hours.
pub fn time_until_rollover<Tz: TimeZone>(date: NaiveDate, now: &DateTime<Tz>) -> Duration {
    let midnight = resolve_local(&now.timezone(), midnight_after(date));
    midnight.signed_duration_since(now)
}

/// Formats a remaining duration as `Hh Mm`, flooring both parts.
pub fn format_countdown(remaining: Duration) -> String {
    let total_minutes = remaining.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    format!("{hours}h {minutes}m")
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn time_key(at: NaiveDateTime) -> String {
    at.format("%H:%M:%S").to_string()
}
