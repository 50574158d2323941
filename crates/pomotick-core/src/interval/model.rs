use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of interval. The name is what gets stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Pomodoro,
    ShortBreak,
    LongBreak,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Pomodoro => "Pomodoro",
            Category::ShortBreak => "ShortBreak",
            Category::LongBreak => "LongBreak",
        }
    }

    pub fn is_break(self) -> bool {
        matches!(self, Category::ShortBreak | Category::LongBreak)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pomodoro" => Ok(Category::Pomodoro),
            "ShortBreak" => Ok(Category::ShortBreak),
            "LongBreak" => Ok(Category::LongBreak),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

/// Lifecycle state. The discriminant is the storage code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalState {
    NotStarted = 0,
    Running = 1,
    Paused = 2,
    Done = 3,
    Cancelled = 4,
}

impl IntervalState {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(IntervalState::NotStarted),
            1 => Some(IntervalState::Running),
            2 => Some(IntervalState::Paused),
            3 => Some(IntervalState::Done),
            4 => Some(IntervalState::Cancelled),
            _ => None,
        }
    }

    /// `Done` and `Cancelled` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, IntervalState::Done | IntervalState::Cancelled)
    }
}

/// One timed unit of work or rest.
///
/// Created by [`get_interval`](super::get_interval) and mutated in place by
/// `start`/`pause`/`end` until it reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub(crate) id: i64,
    pub(crate) start_time: Option<DateTime<Utc>>,
    pub(crate) planned_duration: Duration,
    pub(crate) actual_duration: Duration,
    pub(crate) category: Category,
    pub(crate) state: IntervalState,
}

impl Interval {
    /// A fresh, unpersisted interval (`id == 0`).
    pub fn new(category: Category, planned_duration: Duration) -> Self {
        Self {
            id: 0,
            start_time: None,
            planned_duration,
            actual_duration: Duration::ZERO,
            category,
            state: IntervalState::NotStarted,
        }
    }

    /// Rebuild a stored record. Used by repository backends.
    pub fn restore(
        id: i64,
        start_time: Option<DateTime<Utc>>,
        planned_duration: Duration,
        actual_duration: Duration,
        category: Category,
        state: IntervalState,
    ) -> Self {
        Self {
            id,
            start_time,
            planned_duration,
            actual_duration: actual_duration.min(planned_duration),
            category,
            state,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn planned_duration(&self) -> Duration {
        self.planned_duration
    }

    pub fn actual_duration(&self) -> Duration {
        self.actual_duration
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn state(&self) -> IntervalState {
        self.state
    }

    pub fn remaining(&self) -> Duration {
        self.planned_duration.saturating_sub(self.actual_duration)
    }

    /// 0.0 .. 1.0 progress through the planned duration.
    pub fn progress(&self) -> f64 {
        if self.planned_duration.is_zero() {
            return 0.0;
        }
        self.actual_duration.as_secs_f64() / self.planned_duration.as_secs_f64()
    }
}
