use std::sync::Arc;

use pomotick_core::notify::send_best_effort;
use pomotick_core::{
    current_interval, get_interval, CancelToken, DesktopNotifier, IntervalState, NoopNotifier,
    Notification, Notifier, Severity,
};
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::warn;

use super::open_session;
use crate::display::{self, describe};

/// Run the next interval in the foreground. Ctrl-C cancels it.
pub async fn start(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config) = open_session()?;
    let mut interval = get_interval(&config)?;

    if interval.state() == IntervalState::Running {
        println!(
            "interval {} is already running; use `pomotick end` if its process is gone",
            interval.id()
        );
        return Ok(());
    }

    let notifier: Arc<dyn Notifier> = if settings.notifications.enabled {
        Arc::new(DesktopNotifier)
    } else {
        Arc::new(NoopNotifier)
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let (tx, mut rx) = mpsc::channel(32);
    let display = tokio::spawn(async move {
        let mut pending = Vec::new();
        while let Some(event) = rx.recv().await {
            display::render(&event, json);
            if let Some(notification) = display::notification_for(&event) {
                let notifier = notifier.clone();
                pending.push(tokio::task::spawn_blocking(move || {
                    send_best_effort(notifier.as_ref(), &notification)
                }));
            }
        }
        for handle in pending {
            joined(handle.await, "notification");
        }
    });

    let result = interval.start(&config, &cancel, &tx).await;
    drop(tx);
    joined(display.await, "display");
    result?;
    Ok(())
}

/// Log a background task that panicked or was aborted. True if it finished.
fn joined(result: Result<(), JoinError>, task: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(task, error = %e, "background task failed");
            false
        }
    }
}

pub fn pause() -> Result<(), Box<dyn std::error::Error>> {
    let (_, config) = open_session()?;
    let Some(mut interval) = current_interval(&config)? else {
        println!("Nothing running...");
        return Ok(());
    };

    match interval.pause(&config) {
        Ok(()) => println!("Paused... run `pomotick start` to continue"),
        Err(e) if e.is_not_running() => println!("Nothing running..."),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub fn end() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config) = open_session()?;
    let Some(mut interval) = current_interval(&config)? else {
        println!("Nothing running...");
        return Ok(());
    };

    match interval.end(&config) {
        Ok(()) => {
            let message = format!("{} ended early!", interval.category());
            println!("{message}");
            if settings.notifications.enabled {
                send_best_effort(
                    &DesktopNotifier,
                    &Notification::new("Pomotick", message, Severity::Low),
                );
            }
        }
        Err(e) if e.is_not_running() => println!("Nothing running..."),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub fn status(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, config) = open_session()?;
    let current = current_interval(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&current)?);
        return Ok(());
    }
    match current {
        Some(interval) => println!("{}", describe(&interval)),
        None => println!("Nothing running..."),
    }
    Ok(())
}
