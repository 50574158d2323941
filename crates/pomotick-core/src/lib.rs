//! # Pomotick Core Library
//!
//! Business logic for the Pomotick focus timer. The CLI binary is a thin
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Intervals**: sequencing of Pomodoro/break intervals and an async
//!   countdown state machine that persists every tick
//! - **Repository**: storage trait with in-memory and SQLite backends
//! - **Summary**: per-day and multi-day totals for charts
//! - **Notify**: best-effort desktop notifications
//! - **Storage**: TOML configuration and data directory
//!
//! ## Key Components
//!
//! - [`Interval`]: the interval entity and its `start`/`pause`/`end` operations
//! - [`get_interval`]: returns the open interval or creates the next one
//! - [`Repository`]: storage capability
//! - [`Config`]: application configuration management

pub mod error;
pub mod interval;
pub mod notify;
pub mod repository;
pub mod storage;
pub mod summary;

pub use error::{ConfigError, CoreError, DatabaseError, Result};
pub use interval::{
    current_interval, get_interval, CancelToken, Category, FinishReason, Interval,
    IntervalConfig, IntervalEvent, IntervalState,
};
pub use notify::{DesktopNotifier, NoopNotifier, Notification, Notifier, Severity};
pub use repository::{
    CategoryFilter, InMemoryRepository, Repository, SqliteRepository, UpdateOutcome,
};
pub use storage::{Backend, Config};
pub use summary::{daily_summary, range_summary, DailySummary, LineSeries};
