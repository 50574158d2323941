//! Deciding what comes next.
//!
//! Work and breaks alternate. Every `long_break_every`-th break is long,
//! which with strictly alternating history is the same as "after every
//! `long_break_every`-th Pomodoro".

use tracing::debug;

use super::config::IntervalConfig;
use super::model::{Category, Interval};
use crate::error::{CoreError, Result};

/// The most recent interval if it is still open (not started, running or
/// paused). `None` when the store is empty or the last one is terminal.
pub fn current_interval(config: &IntervalConfig) -> Result<Option<Interval>> {
    match config.repo().last() {
        Ok(last) if !last.state().is_terminal() => Ok(Some(last)),
        Ok(_) | Err(CoreError::NoInterval) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Return the open interval, or create and persist the next one.
///
/// A newly created interval is `NotStarted` with its planned duration taken
/// from `config`.
pub fn get_interval(config: &IntervalConfig) -> Result<Interval> {
    let last = match config.repo().last() {
        Ok(last) => Some(last),
        Err(CoreError::NoInterval) => None,
        Err(e) => return Err(e),
    };

    if let Some(open) = last.as_ref().filter(|i| !i.state().is_terminal()) {
        return Ok(open.clone());
    }

    let category = next_category(config, last.as_ref())?;
    let mut interval = Interval::new(category, config.duration_for(category));
    interval.id = config.repo().create(&interval)?;
    debug!(id = interval.id, %category, "created interval");
    Ok(interval)
}

fn next_category(config: &IntervalConfig, last: Option<&Interval>) -> Result<Category> {
    let Some(last) = last else {
        return Ok(Category::Pomodoro);
    };
    if last.category().is_break() {
        return Ok(Category::Pomodoro);
    }

    let window = config.long_break_every().saturating_sub(1) as usize;
    if window == 0 {
        return Ok(Category::LongBreak);
    }

    let recent = config.repo().breaks(window)?;
    if recent.len() < window || recent.iter().any(|i| i.category() == Category::LongBreak) {
        Ok(Category::ShortBreak)
    } else {
        Ok(Category::LongBreak)
    }
}
