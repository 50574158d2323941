//! Session-wide interval configuration.
//!
//! Built once by the entry point and passed by reference to every
//! interval operation. There is no setter after construction.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::model::Category;
use crate::repository::Repository;

pub const DEFAULT_POMODORO: Duration = Duration::from_secs(25 * 60);
pub const DEFAULT_SHORT_BREAK: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_LONG_BREAK: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_LONG_BREAK_EVERY: u32 = 3;
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct IntervalConfig {
    repo: Arc<dyn Repository>,
    pomodoro: Duration,
    short_break: Duration,
    long_break: Duration,
    long_break_every: u32,
    tick: Duration,
}

fn or_default(value: Duration, default: Duration) -> Duration {
    if value.is_zero() {
        default
    } else {
        value
    }
}

impl IntervalConfig {
    /// Zero durations fall back to 25/5/15 minutes.
    pub fn new(
        repo: Arc<dyn Repository>,
        pomodoro: Duration,
        short_break: Duration,
        long_break: Duration,
    ) -> Self {
        Self {
            repo,
            pomodoro: or_default(pomodoro, DEFAULT_POMODORO),
            short_break: or_default(short_break, DEFAULT_SHORT_BREAK),
            long_break: or_default(long_break, DEFAULT_LONG_BREAK),
            long_break_every: DEFAULT_LONG_BREAK_EVERY,
            tick: DEFAULT_TICK,
        }
    }

    /// Every `n`-th break is long. Zero keeps the default.
    pub fn with_long_break_every(mut self, n: u32) -> Self {
        if n > 0 {
            self.long_break_every = n;
        }
        self
    }

    /// Countdown granularity. Zero keeps the default.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = or_default(tick, DEFAULT_TICK);
        self
    }

    pub fn repo(&self) -> &dyn Repository {
        self.repo.as_ref()
    }

    pub fn duration_for(&self, category: Category) -> Duration {
        match category {
            Category::Pomodoro => self.pomodoro,
            Category::ShortBreak => self.short_break,
            Category::LongBreak => self.long_break,
        }
    }

    pub fn long_break_every(&self) -> u32 {
        self.long_break_every
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }
}

impl fmt::Debug for IntervalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalConfig")
            .field("pomodoro", &self.pomodoro)
            .field("short_break", &self.short_break)
            .field("long_break", &self.long_break)
            .field("long_break_every", &self.long_break_every)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}
