//! Interval state machine.
//!
//! ## State Transitions
//!
//! ```text
//! NotStarted -> Running -> (Paused -> Running | Done | Cancelled)
//! ```
//!
//! `start` drives a tick loop on the caller's task. Every tick is written
//! to the repository before the matching event is sent, so storage is never
//! behind what the display has seen. `pause` and `end` may be issued from a
//! different task (or process, with a shared database) on a copy obtained
//! from [`get_interval`](super::get_interval); the loop picks the change up
//! at its next tick.
//!
//! All writes are conditional on the stored state
//! ([`Repository::update_if`](crate::repository::Repository::update_if)),
//! so a tick never resurrects a paused or ended interval and a stale copy
//! never rolls elapsed time back.

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::cancel::CancelToken;
use super::config::IntervalConfig;
use super::event::{FinishReason, IntervalEvent};
use super::model::{Interval, IntervalState};
use crate::error::{CoreError, Result};
use crate::repository::UpdateOutcome;

impl Interval {
    /// Run the countdown until it completes, is cancelled, or is paused or
    /// ended from elsewhere.
    ///
    /// Valid from `NotStarted` and `Paused` (resume). Calling it on a
    /// running interval is a no-op. Cancellation is not an error.
    ///
    /// # Errors
    /// `IntervalCompleted` on a done or cancelled interval; any storage error,
    /// which aborts the loop and leaves the last persisted state in place.
    pub async fn start(
        &mut self,
        config: &IntervalConfig,
        cancel: &CancelToken,
        events: &mpsc::Sender<IntervalEvent>,
    ) -> Result<()> {
        loop {
            let from = match self.state {
                IntervalState::Running => return Ok(()),
                IntervalState::Done | IntervalState::Cancelled => {
                    return Err(CoreError::IntervalCompleted)
                }
                state => state,
            };
            let mut next = self.clone();
            next.state = IntervalState::Running;
            if from == IntervalState::NotStarted {
                next.start_time = Some(Utc::now());
            }
            // On a stale copy `self` now holds the stored record; re-check it.
            if self.commit(config, &next, from)? {
                break;
            }
        }

        info!(
            id = self.id,
            category = %self.category,
            remaining_ms = self.remaining().as_millis() as u64,
            "interval running"
        );
        emit(
            events,
            IntervalEvent::Started {
                interval: self.clone(),
                at: Utc::now(),
            },
        )
        .await;

        self.run(config, cancel, events).await
    }

    async fn run(
        &mut self,
        config: &IntervalConfig,
        cancel: &CancelToken,
        events: &mpsc::Sender<IntervalEvent>,
    ) -> Result<()> {
        let tick = config.tick();
        let mut ticker = time::interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Tick first: completion beats a simultaneous cancel.
                biased;

                _ = ticker.tick() => {
                    let mut next = self.clone();
                    next.actual_duration = (next.actual_duration + tick).min(next.planned_duration);
                    if !self.commit(config, &next, IntervalState::Running)? {
                        return self.stopped_elsewhere(events).await;
                    }
                    debug!(
                        id = self.id,
                        actual_ms = self.actual_duration.as_millis() as u64,
                        "tick"
                    );
                    emit(events, IntervalEvent::Tick { interval: self.clone(), at: Utc::now() }).await;

                    if self.actual_duration >= self.planned_duration {
                        if !self.transition(config, IntervalState::Running, IntervalState::Done)? {
                            return self.stopped_elsewhere(events).await;
                        }
                        info!(id = self.id, category = %self.category, "interval done");
                        return self.finish(events, FinishReason::Done).await;
                    }
                }

                _ = cancel.cancelled() => {
                    if !self.transition(config, IntervalState::Running, IntervalState::Cancelled)? {
                        return self.stopped_elsewhere(events).await;
                    }
                    info!(
                        id = self.id,
                        actual_ms = self.actual_duration.as_millis() as u64,
                        "interval cancelled"
                    );
                    return self.finish(events, FinishReason::Cancelled).await;
                }
            }
        }
    }

    /// Freeze a running interval. Resume with [`start`](Self::start).
    ///
    /// # Errors
    /// `NotRunning` unless the interval is running in storage; storage errors.
    pub fn pause(&mut self, config: &IntervalConfig) -> Result<()> {
        if self.state != IntervalState::Running
            || !self.transition(config, IntervalState::Running, IntervalState::Paused)?
        {
            return Err(CoreError::NotRunning);
        }
        info!(id = self.id, "interval paused");
        Ok(())
    }

    /// End a running or paused interval early. `actual_duration` keeps its
    /// last recorded value.
    ///
    /// # Errors
    /// `NotRunning` from any other state; storage errors.
    pub fn end(&mut self, config: &IntervalConfig) -> Result<()> {
        loop {
            let from = self.state;
            if !matches!(from, IntervalState::Running | IntervalState::Paused) {
                return Err(CoreError::NotRunning);
            }
            if self.transition(config, from, IntervalState::Cancelled)? {
                break;
            }
        }
        info!(id = self.id, "interval ended early");
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Move from `from` to `next` in storage. See [`commit`](Self::commit).
    fn transition(
        &mut self,
        config: &IntervalConfig,
        from: IntervalState,
        next: IntervalState,
    ) -> Result<bool> {
        let mut target = self.clone();
        target.state = next;
        self.commit(config, &target, from)
    }

    /// Write `next` if the stored state is still `expected`.
    ///
    /// On success or conflict `self` becomes the stored record and the
    /// return value says whether the write applied. On error `self` is left
    /// untouched.
    fn commit(
        &mut self,
        config: &IntervalConfig,
        next: &Interval,
        expected: IntervalState,
    ) -> Result<bool> {
        match config.repo().update_if(next, expected)? {
            UpdateOutcome::Applied(stored) => {
                *self = stored;
                Ok(true)
            }
            UpdateOutcome::Stale(stored) => {
                *self = stored;
                Ok(false)
            }
        }
    }

    /// Finish after losing a write to another handle; `self` already holds
    /// the stored record.
    async fn stopped_elsewhere(&self, events: &mpsc::Sender<IntervalEvent>) -> Result<()> {
        let reason = match self.state {
            IntervalState::Done => FinishReason::Done,
            IntervalState::Cancelled => FinishReason::Cancelled,
            _ => FinishReason::Paused,
        };
        info!(id = self.id, ?reason, "interval stopped elsewhere");
        self.finish(events, reason).await
    }

    async fn finish(
        &self,
        events: &mpsc::Sender<IntervalEvent>,
        reason: FinishReason,
    ) -> Result<()> {
        emit(
            events,
            IntervalEvent::Finished {
                interval: self.clone(),
                reason,
                at: Utc::now(),
            },
        )
        .await;
        Ok(())
    }
}

/// The display is optional: a dropped receiver must not stop the timer.
async fn emit(events: &mpsc::Sender<IntervalEvent>, event: IntervalEvent) {
    if events.send(event).await.is_err() {
        debug!("event receiver dropped");
    }
}
