//! Best-effort desktop notifications.
//!
//! Delivery failures are logged and swallowed by [`send_best_effort`]; they
//! never reach the interval state machine.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CoreError, Result};

const APP_NAME: &str = "pomotick";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Normal,
    Urgent,
}

impl Severity {
    pub fn urgency(self) -> notify_rust::Urgency {
        match self {
            Severity::Low => notify_rust::Urgency::Low,
            Severity::Normal => notify_rust::Urgency::Normal,
            Severity::Urgent => notify_rust::Urgency::Critical,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "low",
            Severity::Normal => "normal",
            Severity::Urgent => "urgent",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
        }
    }

    fn to_desktop(&self) -> notify_rust::Notification {
        let mut desktop = notify_rust::Notification::new();
        desktop
            .appname(APP_NAME)
            .summary(&self.title)
            .body(&self.message)
            .icon("alarm-clock");
        // Urgency is an XDG hint; other platforms have no equivalent.
        #[cfg(all(unix, not(target_os = "macos")))]
        desktop.urgency(self.severity.urgency());
        desktop
    }
}

pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<()>;
}

/// Discards everything. Used when notifications are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn send(&self, _notification: &Notification) -> Result<()> {
        Ok(())
    }
}

/// Shows notifications through the platform's notification service.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn send(&self, notification: &Notification) -> Result<()> {
        notification
            .to_desktop()
            .show()
            .map(|_| ())
            .map_err(|e| CoreError::Notify(e.to_string()))
    }
}

/// Send and log any failure instead of returning it.
pub fn send_best_effort(notifier: &dyn Notifier, notification: &Notification) {
    if let Err(e) = notifier.send(notification) {
        warn!(title = %notification.title, error = %e, "notification failed");
    }
}
