use std::time::Duration;

use chrono::{Local, NaiveDate};
use parking_lot::RwLock;

use super::{CategoryFilter, Repository, UpdateOutcome};
use crate::error::{CoreError, Result};
use crate::interval::{Interval, IntervalState};

/// Volatile store; ids are positions in insertion order, starting at 1.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    intervals: RwLock<Vec<Interval>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn index_of(id: i64, len: usize) -> Option<usize> {
    usize::try_from(id)
        .ok()
        .and_then(|id| id.checked_sub(1))
        .filter(|idx| *idx < len)
}

impl Repository for InMemoryRepository {
    fn create(&self, interval: &Interval) -> Result<i64> {
        let mut intervals = self.intervals.write();
        let id = intervals.len() as i64 + 1;
        let mut stored = interval.clone();
        stored.id = id;
        intervals.push(stored);
        Ok(id)
    }

    fn update(&self, interval: &Interval) -> Result<()> {
        let mut intervals = self.intervals.write();
        let idx = index_of(interval.id, intervals.len()).ok_or(CoreError::NotFound(interval.id))?;
        let stored = &mut intervals[idx];
        stored.start_time = interval.start_time;
        stored.actual_duration = interval.actual_duration.min(stored.planned_duration);
        stored.state = interval.state;
        Ok(())
    }

    fn update_if(&self, interval: &Interval, expected: IntervalState) -> Result<UpdateOutcome> {
        let mut intervals = self.intervals.write();
        let idx = index_of(interval.id, intervals.len()).ok_or(CoreError::NotFound(interval.id))?;
        let stored = &mut intervals[idx];
        if stored.state != expected {
            return Ok(UpdateOutcome::Stale(stored.clone()));
        }
        stored.start_time = stored.start_time.or(interval.start_time);
        stored.actual_duration = stored
            .actual_duration
            .max(interval.actual_duration.min(stored.planned_duration));
        stored.state = interval.state;
        Ok(UpdateOutcome::Applied(stored.clone()))
    }

    fn by_id(&self, id: i64) -> Result<Interval> {
        let intervals = self.intervals.read();
        index_of(id, intervals.len())
            .map(|idx| intervals[idx].clone())
            .ok_or(CoreError::NotFound(id))
    }

    fn last(&self) -> Result<Interval> {
        self.intervals
            .read()
            .last()
            .cloned()
            .ok_or(CoreError::NoInterval)
    }

    fn breaks(&self, n: usize) -> Result<Vec<Interval>> {
        Ok(self
            .intervals
            .read()
            .iter()
            .rev()
            .filter(|i| i.category.is_break())
            .take(n)
            .cloned()
            .collect())
    }

    fn category_summary(&self, day: NaiveDate, filter: CategoryFilter) -> Result<Duration> {
        Ok(self
            .intervals
            .read()
            .iter()
            .filter(|i| filter.matches(i.category))
            .filter(|i| {
                i.start_time
                    .is_some_and(|t| t.with_timezone(&Local).date_naive() == day)
            })
            .map(|i| i.actual_duration)
            .sum())
    }
}
