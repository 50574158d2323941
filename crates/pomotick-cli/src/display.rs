//! Terminal rendering of interval events.

use std::io::Write;
use std::time::Duration;

use pomotick_core::{Category, FinishReason, Interval, IntervalEvent, Notification, Severity};

/// `MM:SS`, or `H:MM:SS` from one hour up.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

fn headline(category: Category) -> &'static str {
    match category {
        Category::Pomodoro => "Focus on your task",
        Category::ShortBreak | Category::LongBreak => "Take a break",
    }
}

pub fn describe(interval: &Interval) -> String {
    format!(
        "#{} {} {:?}: {} of {} ({} left)",
        interval.id(),
        interval.category(),
        interval.state(),
        format_duration(interval.actual_duration()),
        format_duration(interval.planned_duration()),
        format_duration(interval.remaining()),
    )
}

/// Human-readable line for an event. Ticks start with `\r` so they
/// overwrite each other.
pub fn line(event: &IntervalEvent) -> String {
    match event {
        IntervalEvent::Started { interval, .. } => format!(
            "{}: {} ({} left)",
            interval.category(),
            headline(interval.category()),
            format_duration(interval.remaining()),
        ),
        IntervalEvent::Tick { interval, .. } => format!(
            "\r{} / {}",
            format_duration(interval.remaining()),
            format_duration(interval.planned_duration()),
        ),
        IntervalEvent::Finished {
            interval, reason, ..
        } => match reason {
            FinishReason::Done => format!("\n{} finished!", interval.category()),
            FinishReason::Cancelled => format!("\n{} ended early!", interval.category()),
            FinishReason::Paused => "\nPaused... run `pomotick start` to continue".to_string(),
        },
    }
}

pub fn render(event: &IntervalEvent, json: bool) {
    let mut out = std::io::stdout().lock();
    let _ = if json {
        match serde_json::to_string(event) {
            Ok(s) => writeln!(out, "{s}"),
            Err(e) => writeln!(out, "{{\"error\": \"{e}\"}}"),
        }
    } else if matches!(event, IntervalEvent::Tick { .. }) {
        write!(out, "{}", line(event))
    } else {
        writeln!(out, "{}", line(event))
    };
    let _ = out.flush();
}

/// Desktop notification worth sending for this event, if any.
pub fn notification_for(event: &IntervalEvent) -> Option<Notification> {
    match event {
        IntervalEvent::Started { interval, .. } => Some(Notification::new(
            interval.category().to_string(),
            headline(interval.category()),
            Severity::Normal,
        )),
        IntervalEvent::Tick { .. } => None,
        IntervalEvent::Finished {
            interval,
            reason: FinishReason::Done,
            ..
        } => Some(Notification::new(
            "Pomotick",
            format!("{} finished!", interval.category()),
            Severity::Urgent,
        )),
        IntervalEvent::Finished {
            interval,
            reason: FinishReason::Cancelled,
            ..
        } => Some(Notification::new(
            "Pomotick",
            format!("{} ended early!", interval.category()),
            Severity::Low,
        )),
        IntervalEvent::Finished { .. } => None,
    }
}
