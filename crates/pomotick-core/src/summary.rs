//! Daily and multi-day totals for charts.
//!
//! Both functions only read from the repository.

use std::time::Duration;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::interval::IntervalConfig;
use crate::repository::CategoryFilter;

/// Accumulated actual time on one local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailySummary {
    pub pomodoro: Duration,
    pub breaks: Duration,
}

/// One named chart series. `labels[i]` names the point `values[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl LineSeries {
    fn with_capacity(name: &str, n: usize) -> Self {
        Self {
            name: name.to_string(),
            labels: Vec::with_capacity(n),
            values: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, label: String, value: Duration) {
        self.labels.push(label);
        self.values.push(value.as_secs_f64());
    }
}

pub fn daily_summary(day: NaiveDate, config: &IntervalConfig) -> Result<DailySummary> {
    Ok(DailySummary {
        pomodoro: config.repo().category_summary(day, CategoryFilter::Pomodoro)?,
        breaks: config.repo().category_summary(day, CategoryFilter::Breaks)?,
    })
}

/// `n_days` days ending at `start`, newest first: a "Pomodoro" and a
/// "Break" series, values in seconds, labelled like `07/Mar`.
pub fn range_summary(
    start: NaiveDate,
    n_days: usize,
    config: &IntervalConfig,
) -> Result<[LineSeries; 2]> {
    let mut pomodoro = LineSeries::with_capacity("Pomodoro", n_days);
    let mut breaks = LineSeries::with_capacity("Break", n_days);

    for offset in 0..n_days {
        let Some(day) = start.checked_sub_days(Days::new(offset as u64)) else {
            break;
        };
        let daily = daily_summary(day, config)?;
        let label = day.format("%d/%b").to_string();
        pomodoro.push(label.clone(), daily.pomodoro);
        breaks.push(label, daily.breaks);
    }

    Ok([pomodoro, breaks])
}
