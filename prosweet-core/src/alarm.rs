//! VALARM reminders attached to events, and the schedule of when they fire.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::CalendarEvent;
use crate::ics::{format_ics_utc, parse_ics_utc};

/// A reminder attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub action: AlarmAction,
    pub trigger: AlarmTrigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Alarm {
    /// A DISPLAY alarm firing `before` ahead of the event start.
    pub fn display_before(before: Duration, description: impl Into<String>) -> Self {
        Alarm {
            action: AlarmAction::Display,
            trigger: AlarmTrigger::Relative(-before),
            description: Some(description.into()),
        }
    }

    /// The instant this alarm fires for an event starting at `start`.
    pub fn fire_time(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        match self.trigger {
            AlarmTrigger::Relative(offset) => start + offset,
            AlarmTrigger::Absolute(at) => at,
        }
    }
}

/// ACTION of a VALARM. Unknown actions are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum AlarmAction {
    Display,
    Audio,
    Email,
    Other(String),
}

impl AlarmAction {
    pub fn as_ics_str(&self) -> &str {
        match self {
            AlarmAction::Display => "DISPLAY",
            AlarmAction::Audio => "AUDIO",
            AlarmAction::Email => "EMAIL",
            AlarmAction::Other(action) => action,
        }
    }
}

impl From<String> for AlarmAction {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "DISPLAY" => AlarmAction::Display,
            "AUDIO" => AlarmAction::Audio,
            "EMAIL" => AlarmAction::Email,
            _ => AlarmAction::Other(value),
        }
    }
}

impl From<AlarmAction> for String {
    fn from(action: AlarmAction) -> Self {
        action.as_ics_str().to_string()
    }
}

/// When an alarm fires: an offset from the event start, or a fixed instant.
///
/// The string form is the iCalendar TRIGGER value, e.g. `-PT10M` or
/// `20251026T065000Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum AlarmTrigger {
    /// Negative offsets fire before the start.
    Relative(Duration),
    Absolute(DateTime<Utc>),
}

impl fmt::Display for AlarmTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmTrigger::Relative(offset) => f.write_str(&format_ics_duration(*offset)),
            AlarmTrigger::Absolute(at) => f.write_str(&format_ics_utc(at)),
        }
    }
}

impl FromStr for AlarmTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let unsigned = s.trim_start_matches(['-', '+']);

        if unsigned.starts_with('P') {
            return parse_ics_duration(s)
                .map(AlarmTrigger::Relative)
                .ok_or_else(|| format!("Invalid alarm duration: {}", s));
        }

        if let Some(at) = parse_ics_utc(s) {
            return Ok(AlarmTrigger::Absolute(at));
        }

        // RFC 3339 instants, as handed over by the command layer
        DateTime::parse_from_rfc3339(s)
            .map(|dt| AlarmTrigger::Absolute(dt.with_timezone(&Utc)))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                    .map(|dt| AlarmTrigger::Absolute(dt.and_utc()))
            })
            .map_err(|_| format!("Invalid alarm trigger: {}", s))
    }
}

impl From<AlarmTrigger> for String {
    fn from(trigger: AlarmTrigger) -> Self {
        trigger.to_string()
    }
}

impl TryFrom<String> for AlarmTrigger {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Format a signed duration as an RFC 5545 DURATION value (`-PT10M`, `P1DT2H`).
pub fn format_ics_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let mut secs = total.unsigned_abs();

    let days = secs / 86_400;
    secs %= 86_400;
    let hours = secs / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;

    if days == 0 && hours == 0 && minutes == 0 && seconds == 0 {
        return "PT0S".to_string();
    }

    let mut out = format!("{}P", sign);
    if days > 0 {
        out.push_str(&format!("{}D", days));
    }
    if hours > 0 || minutes > 0 || seconds > 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{}H", hours));
        }
        if minutes > 0 {
            out.push_str(&format!("{}M", minutes));
        }
        if seconds > 0 {
            out.push_str(&format!("{}S", seconds));
        }
    }
    out
}

/// Parse an RFC 5545 DURATION value (-PT30M, P1D, -P2W, ...).
pub fn parse_ics_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let is_negative = value.starts_with('-');
    let duration_str = value.trim_start_matches(['-', '+']);

    let duration = iso8601::duration(duration_str).ok()?;
    let std_duration: std::time::Duration = duration.into();
    let duration = Duration::from_std(std_duration).ok()?;

    Some(if is_negative { -duration } else { duration })
}

/// How far ahead alarms are looked up when no end is given.
pub const DEFAULT_ALARM_WINDOW_DAYS: i64 = 30;

/// The alarm lookup window: `from` defaults to `now`, `to` to
/// [`DEFAULT_ALARM_WINDOW_DAYS`] after `now`.
pub fn alarm_window(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        from.unwrap_or(now),
        to.unwrap_or(now + Duration::days(DEFAULT_ALARM_WINDOW_DAYS)),
    )
}

/// An alarm together with the event it belongs to and when it fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledAlarm<'a> {
    pub at: DateTime<Utc>,
    pub event: &'a CalendarEvent,
    pub alarm: &'a Alarm,
}

/// Every alarm firing inside `[from, to]`, sorted by firing time.
///
/// Relative triggers are offset from the event start; events without a start
/// contribute only their absolute triggers.
pub fn scheduled_alarms<'a>(
    events: impl IntoIterator<Item = &'a CalendarEvent>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<ScheduledAlarm<'a>> {
    let mut scheduled: Vec<ScheduledAlarm<'a>> = events
        .into_iter()
        .flat_map(|event| {
            event.alarms.iter().filter_map(move |alarm| {
                let at = match alarm.trigger {
                    AlarmTrigger::Absolute(at) => at,
                    AlarmTrigger::Relative(_) => alarm.fire_time(event.start?),
                };
                Some(ScheduledAlarm { at, event, alarm })
            })
        })
        .filter(|scheduled| scheduled.at >= from && scheduled.at <= to)
        .collect();

    scheduled.sort_by_key(|scheduled| scheduled.at);
    scheduled
}

/// The instants of [`scheduled_alarms`].
pub fn alarm_fire_times<'a>(
    events: impl IntoIterator<Item = &'a CalendarEvent>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    scheduled_alarms(events, from, to)
        .into_iter()
        .map(|scheduled| scheduled.at)
        .collect()
}
