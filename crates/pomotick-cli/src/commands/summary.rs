use chrono::Local;
use pomotick_core::range_summary;

use super::open_session;
use crate::display::format_duration;

pub fn run(days: usize, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, config) = open_session()?;
    let today = Local::now().date_naive();
    let series = range_summary(today, days, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    let [pomodoro, breaks] = &series;
    println!("{:<8} {:>9} {:>9}", "day", "pomodoro", "breaks");
    for ((label, focus), rest) in pomodoro
        .labels
        .iter()
        .zip(&pomodoro.values)
        .zip(&breaks.values)
    {
        println!(
            "{:<8} {:>9} {:>9}",
            label,
            format_duration(std::time::Duration::from_secs_f64(*focus)),
            format_duration(std::time::Duration::from_secs_f64(*rest)),
        );
    }
    Ok(())
}
