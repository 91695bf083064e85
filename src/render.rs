//! Terminal rendering for calendar types.

use owo_colors::OwoColorize;
use prosweet_core::{Alarm, CalendarEvent};

/// Extension trait for colored terminal output.
pub trait Render {
    fn render(&self) -> String;
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

impl Render for CalendarEvent {
    fn render(&self) -> String {
        let summary = self.summary.as_deref().unwrap_or("(untitled)");
        format!(
            "{} {} {}",
            summary.bold(),
            render_time_range(self).dimmed(),
            self.uid_str().dimmed()
        )
    }
}

impl Render for Alarm {
    fn render(&self) -> String {
        let line = format!("{} {} {}", "⏰".yellow(), self.action.as_ics_str(), self.trigger);
        match &self.description {
            Some(description) => format!("{} {}", line, description.dimmed()),
            None => line,
        }
    }
}

fn render_time_range(event: &CalendarEvent) -> String {
    match (event.start, event.end) {
        (Some(start), Some(end)) if start.date_naive() == end.date_naive() => format!(
            "{} - {} UTC",
            start.format(TIME_FORMAT),
            end.format("%H:%M")
        ),
        (Some(start), Some(end)) => {
            format!("{} - {} UTC", start.format(TIME_FORMAT), end.format(TIME_FORMAT))
        }
        (Some(start), None) => format!("{} UTC", start.format(TIME_FORMAT)),
        _ => "(no time)".to_string(),
    }
}

/// Full view of one event, one field per line.
pub fn render_details(event: &CalendarEvent) -> Vec<String> {
    let mut lines = vec![event.render()];
    if let Some(description) = event.description.as_deref() {
        lines.push(format!("   {}", description));
    }
    for alarm in &event.alarms {
        lines.push(format!("   {}", alarm.render()));
    }
    lines.push(format!("   {} {}", "sequence".dimmed(), event.sequence));
    if let Some(etag) = event.etag.as_deref() {
        lines.push(format!("   {} {}", "etag".dimmed(), etag));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn time_range_on_one_day_is_compact() {
        let start = Utc.with_ymd_and_hms(2025, 10, 26, 7, 0, 0).unwrap();
        let event = CalendarEvent::new("Yoga", start, start + chrono::Duration::hours(1));

        assert_eq!(render_time_range(&event), "2025-10-26 07:00 - 08:00 UTC");
    }

    #[test]
    fn time_range_without_times() {
        assert_eq!(render_time_range(&CalendarEvent::default()), "(no time)");
    }
}
