//! End-to-end interval runs against both backends.
//!
//! Tokio's paused clock makes one-second ticks instantaneous and exact.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use pomotick_core::{
    current_interval, get_interval, CancelToken, Category, CategoryFilter, CoreError,
    FinishReason, InMemoryRepository, Interval, IntervalConfig, IntervalEvent, IntervalState,
    Repository, Result, SqliteRepository, UpdateOutcome,
};
use tokio::sync::mpsc;

const UNIT: Duration = Duration::from_secs(1);

fn config_with(repo: Arc<dyn Repository>, pomodoro: u32, short: u32, long: u32) -> IntervalConfig {
    IntervalConfig::new(repo, UNIT * pomodoro, UNIT * short, UNIT * long)
}

async fn run_cycles(config: &IntervalConfig, n: usize) -> Vec<(Category, Duration)> {
    let (tx, mut rx) = mpsc::channel(64);
    let mut seen = Vec::new();
    for _ in 0..n {
        let mut interval = get_interval(config).unwrap();
        assert_eq!(interval.state(), IntervalState::NotStarted);
        interval.start(config, &CancelToken::new(), &tx).await.unwrap();

        let stored = config.repo().by_id(interval.id()).unwrap();
        assert_eq!(stored.state(), IntervalState::Done);
        assert_eq!(stored.actual_duration(), stored.planned_duration());
        seen.push((stored.category(), stored.planned_duration()));
        while rx.try_recv().is_ok() {}
    }
    seen
}

fn expected_six() -> Vec<(Category, Duration)> {
    use Category::*;
    vec![
        (Pomodoro, UNIT * 3),
        (ShortBreak, UNIT),
        (Pomodoro, UNIT * 3),
        (ShortBreak, UNIT),
        (Pomodoro, UNIT * 3),
        (LongBreak, UNIT * 2),
    ]
}

#[tokio::test(start_paused = true)]
async fn first_six_intervals_in_memory() {
    let config = config_with(Arc::new(InMemoryRepository::new()), 3, 1, 2);
    assert_eq!(run_cycles(&config, 6).await, expected_six());
}

#[tokio::test(start_paused = true)]
async fn first_six_intervals_sqlite_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let repo = SqliteRepository::open(dir.path().join("pomotick.db")).unwrap();
    let config = config_with(Arc::new(repo), 3, 1, 2);
    assert_eq!(run_cycles(&config, 6).await, expected_six());
}

#[tokio::test(start_paused = true)]
async fn sixteen_intervals_follow_the_cadence() {
    let config = config_with(Arc::new(InMemoryRepository::new()), 3, 1, 2);
    let seen = run_cycles(&config, 16).await;
    for (n, (category, _)) in seen.iter().enumerate() {
        let i = n + 1;
        let expected = if i % 2 != 0 {
            Category::Pomodoro
        } else if i % 6 == 0 {
            Category::LongBreak
        } else {
            Category::ShortBreak
        };
        assert_eq!(*category, expected, "interval {i}");
    }
}

#[tokio::test(start_paused = true)]
async fn ticks_are_monotonic_and_bounded() {
    let config = config_with(Arc::new(InMemoryRepository::new()), 5, 1, 1);
    let mut interval = get_interval(&config).unwrap();
    let (tx, mut rx) = mpsc::channel(64);

    interval.start(&config, &CancelToken::new(), &tx).await.unwrap();
    drop(tx);

    let mut previous = Duration::ZERO;
    let mut ticks = 0;
    while let Some(event) = rx.recv().await {
        if let IntervalEvent::Tick { interval, .. } = event {
            assert!(interval.actual_duration() >= previous);
            assert!(interval.actual_duration() <= interval.planned_duration());
            assert_eq!(interval.state(), IntervalState::Running);
            previous = interval.actual_duration();
            ticks += 1;
        }
    }
    assert_eq!(ticks, 5);
    assert_eq!(previous, UNIT * 5);
}

#[tokio::test(start_paused = true)]
async fn cancelled_run_keeps_partial_time() {
    let config = config_with(Arc::new(InMemoryRepository::new()), 2, 2, 2);
    let mut interval = get_interval(&config).unwrap();
    let (tx, mut rx) = mpsc::channel(64);
    let cancel = CancelToken::new();

    // Cancel as soon as the first tick is seen, like a user hitting "end".
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut reasons = Vec::new();
            while let Some(event) = rx.recv().await {
                match event {
                    IntervalEvent::Tick { .. } => cancel.cancel(),
                    IntervalEvent::Finished { reason, .. } => reasons.push(reason),
                    IntervalEvent::Started { interval, .. } => {
                        assert_eq!(interval.state(), IntervalState::Running);
                        assert!(interval.actual_duration() < interval.planned_duration());
                    }
                }
            }
            reasons
        })
    };

    interval.start(&config, &cancel, &tx).await.unwrap();
    drop(tx);

    assert_eq!(watcher.await.unwrap(), vec![FinishReason::Cancelled]);
    let stored = config.repo().by_id(interval.id()).unwrap();
    assert_eq!(stored.state(), IntervalState::Cancelled);
    assert_eq!(stored.actual_duration(), UNIT);
}

#[tokio::test(start_paused = true)]
async fn cancel_at_the_final_tick_still_completes() {
    let config = config_with(Arc::new(InMemoryRepository::new()), 1, 1, 1);
    let mut interval = get_interval(&config).unwrap();
    let (tx, _rx) = mpsc::channel(64);
    let cancel = CancelToken::new();

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(UNIT).await;
            cancel.cancel();
        })
    };

    interval.start(&config, &cancel, &tx).await.unwrap();
    canceller.await.unwrap();

    let stored = config.repo().by_id(interval.id()).unwrap();
    assert_eq!(stored.state(), IntervalState::Done);
    assert_eq!(stored.actual_duration(), UNIT);
}

#[tokio::test(start_paused = true)]
async fn pause_outside_running_leaves_storage_alone() {
    let config = config_with(Arc::new(InMemoryRepository::new()), 2, 1, 1);
    let (tx, _rx) = mpsc::channel(64);

    // Not started.
    let mut fresh = get_interval(&config).unwrap();
    let before = config.repo().by_id(fresh.id()).unwrap();
    assert!(fresh.pause(&config).unwrap_err().is_not_running());
    assert!(fresh.end(&config).unwrap_err().is_not_running());
    assert_eq!(config.repo().by_id(fresh.id()).unwrap(), before);

    // Done.
    fresh.start(&config, &CancelToken::new(), &tx).await.unwrap();
    let before = config.repo().by_id(fresh.id()).unwrap();
    assert!(fresh.pause(&config).unwrap_err().is_not_running());
    assert!(fresh.end(&config).unwrap_err().is_not_running());
    assert_eq!(config.repo().by_id(fresh.id()).unwrap(), before);
}

#[tokio::test(start_paused = true)]
async fn pause_and_end_from_paused_or_cancelled() {
    let config = config_with(Arc::new(InMemoryRepository::new()), 10, 1, 1);
    let mut interval = get_interval(&config).unwrap();
    let (tx, _rx) = mpsc::channel(64);

    let pauser = {
        let config = config.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            current_interval(&config).unwrap().unwrap().pause(&config).unwrap();
        })
    };
    interval.start(&config, &CancelToken::new(), &tx).await.unwrap();
    pauser.await.unwrap();
    assert_eq!(interval.state(), IntervalState::Paused);

    // Paused: pause is rejected, end is allowed.
    let before = config.repo().by_id(interval.id()).unwrap();
    assert!(interval.pause(&config).unwrap_err().is_not_running());
    assert_eq!(config.repo().by_id(interval.id()).unwrap(), before);

    interval.end(&config).unwrap();
    let before = config.repo().by_id(interval.id()).unwrap();
    assert_eq!(before.state(), IntervalState::Cancelled);
    assert_eq!(before.actual_duration(), UNIT * 2);

    // Cancelled: both are rejected.
    assert!(interval.pause(&config).unwrap_err().is_not_running());
    assert!(interval.end(&config).unwrap_err().is_not_running());
    assert_eq!(config.repo().by_id(interval.id()).unwrap(), before);
}

/// In-memory store that runs `action` through a second handle right
/// before the `nth` tick write reaches storage.
struct InterleaveOnTick {
    inner: Arc<InMemoryRepository>,
    nth: usize,
    ticks: AtomicUsize,
    action: fn(&IntervalConfig) -> Result<()>,
    outcome: Mutex<Option<Result<()>>>,
}

impl InterleaveOnTick {
    fn new(nth: usize, action: fn(&IntervalConfig) -> Result<()>) -> Self {
        Self {
            inner: Arc::new(InMemoryRepository::new()),
            nth,
            ticks: AtomicUsize::new(0),
            action,
            outcome: Mutex::new(None),
        }
    }
}

impl Repository for InterleaveOnTick {
    fn create(&self, interval: &Interval) -> Result<i64> {
        self.inner.create(interval)
    }
    fn update(&self, interval: &Interval) -> Result<()> {
        self.inner.update(interval)
    }
    fn update_if(&self, interval: &Interval, expected: IntervalState) -> Result<UpdateOutcome> {
        let is_tick =
            expected == IntervalState::Running && interval.state() == IntervalState::Running;
        if is_tick && self.ticks.fetch_add(1, Ordering::SeqCst) + 1 == self.nth {
            let other = IntervalConfig::new(
                self.inner.clone(),
                Duration::ZERO,
                Duration::ZERO,
                Duration::ZERO,
            );
            *self.outcome.lock().unwrap() = Some((self.action)(&other));
        }
        self.inner.update_if(interval, expected)
    }
    fn by_id(&self, id: i64) -> Result<Interval> {
        self.inner.by_id(id)
    }
    fn last(&self) -> Result<Interval> {
        self.inner.last()
    }
    fn breaks(&self, n: usize) -> Result<Vec<Interval>> {
        self.inner.breaks(n)
    }
    fn category_summary(&self, day: NaiveDate, filter: CategoryFilter) -> Result<Duration> {
        self.inner.category_summary(day, filter)
    }
}

fn pause_current(config: &IntervalConfig) -> Result<()> {
    current_interval(config)?
        .ok_or(CoreError::NoInterval)?
        .pause(config)
}

fn end_current(config: &IntervalConfig) -> Result<()> {
    current_interval(config)?.ok_or(CoreError::NoInterval)?.end(config)
}

#[tokio::test(start_paused = true)]
async fn pause_landing_just_before_a_tick_write_is_kept() {
    let repo = Arc::new(InterleaveOnTick::new(2, pause_current));
    let config = config_with(repo.clone(), 5, 1, 1);
    let mut interval = get_interval(&config).unwrap();
    let (tx, mut rx) = mpsc::channel(64);

    interval.start(&config, &CancelToken::new(), &tx).await.unwrap();
    drop(tx);

    assert!(matches!(repo.outcome.lock().unwrap().take(), Some(Ok(()))));
    let stored = repo.by_id(interval.id()).unwrap();
    assert_eq!(stored.state(), IntervalState::Paused);
    assert_eq!(stored.actual_duration(), UNIT);
    assert_eq!(interval, stored);

    let mut last = None;
    while let Some(event) = rx.recv().await {
        last = Some(event);
    }
    assert!(matches!(
        last,
        Some(IntervalEvent::Finished { reason: FinishReason::Paused, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn end_landing_just_before_a_tick_write_is_kept() {
    let repo = Arc::new(InterleaveOnTick::new(3, end_current));
    let config = config_with(repo.clone(), 5, 1, 1);
    let mut interval = get_interval(&config).unwrap();
    let (tx, _rx) = mpsc::channel(64);

    interval.start(&config, &CancelToken::new(), &tx).await.unwrap();

    assert!(matches!(repo.outcome.lock().unwrap().take(), Some(Ok(()))));
    let stored = repo.by_id(interval.id()).unwrap();
    assert_eq!(stored.state(), IntervalState::Cancelled);
    assert_eq!(stored.actual_duration(), UNIT * 2);
    assert_eq!(interval.state(), IntervalState::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn end_from_another_task_cancels_the_run() {
    let config = config_with(Arc::new(InMemoryRepository::new()), 10, 1, 1);
    let mut interval = get_interval(&config).unwrap();
    let (tx, _rx) = mpsc::channel(64);

    let ender = {
        let config = config.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(3500)).await;
            let mut current = get_interval(&config).unwrap();
            assert_eq!(current.state(), IntervalState::Running);
            current.end(&config).unwrap();
        })
    };

    interval.start(&config, &CancelToken::new(), &tx).await.unwrap();
    ender.await.unwrap();

    assert_eq!(interval.state(), IntervalState::Cancelled);
    let stored = config.repo().by_id(interval.id()).unwrap();
    assert_eq!(stored.state(), IntervalState::Cancelled);
    assert_eq!(stored.actual_duration(), UNIT * 3);

    // The next interval is a break: the cancelled Pomodoro is history.
    assert_eq!(
        get_interval(&config).unwrap().category(),
        Category::ShortBreak
    );
}

#[tokio::test(start_paused = true)]
async fn dropped_display_does_not_stop_the_timer() {
    let config = config_with(Arc::new(InMemoryRepository::new()), 2, 1, 1);
    let mut interval = get_interval(&config).unwrap();
    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    interval.start(&config, &CancelToken::new(), &tx).await.unwrap();
    assert_eq!(interval.state(), IntervalState::Done);
}
