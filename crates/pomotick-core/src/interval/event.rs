use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::Interval;

/// Why the countdown loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReason {
    /// Ran to the planned duration.
    Done,
    /// Cancel signal fired, or the interval was ended from elsewhere.
    Cancelled,
    /// Paused from elsewhere; a later `start` resumes it.
    Paused,
}

/// Progress of a running interval, delivered in order to the display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IntervalEvent {
    Started {
        interval: Interval,
        at: DateTime<Utc>,
    },
    Tick {
        interval: Interval,
        at: DateTime<Utc>,
    },
    Finished {
        interval: Interval,
        reason: FinishReason,
        at: DateTime<Utc>,
    },
}

impl IntervalEvent {
    pub fn interval(&self) -> &Interval {
        match self {
            IntervalEvent::Started { interval, .. }
            | IntervalEvent::Tick { interval, .. }
            | IntervalEvent::Finished { interval, .. } => interval,
        }
    }
}
