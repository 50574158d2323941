//! Interval storage.
//!
//! Two interchangeable backends implement [`Repository`]:
//! - [`InMemoryRepository`]: process-lifetime only
//! - [`SqliteRepository`]: a single `interval` table on disk
//!
//! Writes are serialized by each backend's lock; reads may run concurrently
//! where the backend allows it.

mod memory;
mod sqlite;

pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;

use std::time::Duration;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::Result;
use crate::interval::{Category, Interval, IntervalState};

/// Storage capability for interval records.
pub trait Repository: Send + Sync {
    /// Persist a new record and return its id.
    fn create(&self, interval: &Interval) -> Result<i64>;

    /// Overwrite start time, actual duration and state of an existing record.
    /// Category and planned duration are never touched; actual duration is
    /// clamped to the stored planned duration.
    fn update(&self, interval: &Interval) -> Result<()>;

    /// Like [`update`](Self::update), but only while the stored state is
    /// still `expected`, and atomically with that check.
    ///
    /// An applied write never lowers the stored actual duration and never
    /// replaces a start time that is already set. Either way the record as
    /// stored afterwards is returned.
    fn update_if(&self, interval: &Interval, expected: IntervalState) -> Result<UpdateOutcome>;

    fn by_id(&self, id: i64) -> Result<Interval>;

    /// Most recently created record; `CoreError::NoInterval` when empty.
    fn last(&self) -> Result<Interval>;

    /// Up to `n` most recent breaks of either kind, newest first.
    fn breaks(&self, n: usize) -> Result<Vec<Interval>>;

    /// Total actual duration of matching records started on local `day`.
    fn category_summary(&self, day: NaiveDate, filter: CategoryFilter) -> Result<Duration>;
}

/// Result of [`Repository::update_if`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The write went through; the stored record after it.
    Applied(Interval),
    /// The stored state was no longer the expected one; nothing was written.
    Stale(Interval),
}

/// Category selector for summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    Pomodoro,
    /// Anything whose name ends with "Break".
    Breaks,
}

impl CategoryFilter {
    pub fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::Pomodoro => category == Category::Pomodoro,
            CategoryFilter::Breaks => category.as_str().ends_with("Break"),
        }
    }

    /// SQL `LIKE` pattern for the same selection.
    pub fn like_pattern(self) -> &'static str {
        match self {
            CategoryFilter::Pomodoro => "Pomodoro",
            CategoryFilter::Breaks => "%Break",
        }
    }
}

/// UTC instants bounding local calendar day `day`, half-open.
pub fn local_day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = day.succ_opt().unwrap_or(NaiveDate::MAX);
    (local_midnight(day), local_midnight(next))
}

fn local_midnight(day: NaiveDate) -> DateTime<Utc> {
    let naive = day.and_time(NaiveTime::MIN);
    match chrono::Local.from_local_datetime(&naive) {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Midnight skipped by a DST jump: the day starts at the first valid hour.
        LocalResult::None => chrono::Local
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
    }
}
