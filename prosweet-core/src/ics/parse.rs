//! ICS parsing using the icalendar crate's parser.
//!
//! Decoding is lenient field by field: a missing or malformed property becomes
//! `None` on the decoded event instead of failing the whole document.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use icalendar::parser::{Component, Property, read_calendar, unfold};
use tracing::{debug, warn};

use crate::alarm::{Alarm, AlarmAction, AlarmTrigger};
use crate::event::CalendarEvent;
use crate::ics::parse_ics_utc;

/// Lazily decode every VEVENT in a calendar document.
///
/// Blocks are located and parsed one at a time as the iterator advances. A
/// block the parser cannot read at all is skipped.
pub fn decode_events(content: &str) -> impl Iterator<Item = CalendarEvent> + '_ {
    VEventBlocks { rest: content }.filter_map(|block| {
        let event = decode_block(block);
        if event.is_none() {
            warn!("Skipping unreadable VEVENT block ({} bytes)", block.len());
        }
        event
    })
}

/// Decode the first VEVENT in a calendar document.
pub fn decode_event(content: &str) -> Option<CalendarEvent> {
    decode_events(content).next()
}

/// Iterator over the raw `BEGIN:VEVENT` .. `END:VEVENT` spans of a document.
struct VEventBlocks<'a> {
    rest: &'a str,
}

impl<'a> Iterator for VEventBlocks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        const END: &str = "END:VEVENT";

        let begin = find_line(self.rest, "BEGIN:VEVENT")?;
        let from_begin = &self.rest[begin..];

        match find_line(from_begin, END) {
            Some(end) => {
                let end = end + END.len();
                self.rest = &from_begin[end..];
                Some(&from_begin[..end])
            }
            None => {
                // Truncated document: the last block never closes
                debug!("Unterminated VEVENT block at end of document");
                self.rest = "";
                None
            }
        }
    }
}

/// Byte offset of `needle` when it appears as a whole line.
fn find_line(haystack: &str, needle: &str) -> Option<usize> {
    haystack.match_indices(needle).map(|(idx, _)| idx).find(|&idx| {
        let at_line_start = idx == 0 || haystack.as_bytes()[idx - 1] == b'\n';
        let rest = &haystack[idx + needle.len()..];
        let at_line_end = rest.is_empty() || rest.starts_with('\r') || rest.starts_with('\n');
        at_line_start && at_line_end
    })
}

fn decode_block(block: &str) -> Option<CalendarEvent> {
    let wrapped = format!("BEGIN:VCALENDAR\r\n{}\r\nEND:VCALENDAR\r\n", block.trim_end());
    let unfolded = unfold(&wrapped);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = calendar.components.iter().find(|c| c.name == "VEVENT")?;

    let uid = text_prop(vevent, "UID");
    let summary = text_prop(vevent, "SUMMARY");
    let description = text_prop(vevent, "DESCRIPTION");

    let start = vevent.find_prop("DTSTART").and_then(parse_time_property);
    let end = vevent.find_prop("DTEND").and_then(parse_time_property);

    let sequence = vevent
        .find_prop("SEQUENCE")
        .and_then(|p| p.val.as_ref().trim().parse().ok())
        .unwrap_or(0);

    let alarms: Vec<Alarm> = vevent
        .components
        .iter()
        .filter(|c| c.name == "VALARM")
        .filter_map(parse_alarm)
        .collect();

    Some(CalendarEvent {
        uid,
        summary,
        description,
        start,
        end,
        sequence,
        etag: None,
        alarms,
    })
}

/// A text property, with empty values treated as absent.
fn text_prop(component: &Component, name: &str) -> Option<String> {
    component
        .find_prop(name)
        .map(|p| p.val.to_string())
        .filter(|v| !v.is_empty())
}

fn parse_alarm(alarm: &Component) -> Option<Alarm> {
    let trigger = alarm.find_prop("TRIGGER")?.val.as_ref();
    let trigger: AlarmTrigger = match trigger.parse() {
        Ok(trigger) => trigger,
        Err(e) => {
            debug!("Dropping VALARM: {}", e);
            return None;
        }
    };

    let action = alarm
        .find_prop("ACTION")
        .map(|p| AlarmAction::from(p.val.to_string()))
        .unwrap_or(AlarmAction::Display);

    Some(Alarm {
        action,
        trigger,
        description: text_prop(alarm, "DESCRIPTION"),
    })
}

/// Read a DTSTART/DTEND style property as a UTC instant.
///
/// Handles:
/// - UTC: `DTSTART:20251026T070000Z`
/// - TZID parameter: `DTSTART;TZID=Europe/Berlin:20251026T090000`
/// - Floating: `DTSTART:20251026T070000` (read as UTC)
/// - VALUE=DATE: `DTSTART;VALUE=DATE:20251026` (midnight UTC)
///
/// Anything else yields `None`.
fn parse_time_property(prop: &Property) -> Option<DateTime<Utc>> {
    let value = prop.val.as_ref().trim();

    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    if is_date || value.len() == 8 {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
    }

    if let Some(utc) = parse_ics_utc(value) {
        return Some(utc);
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;

    match tzid {
        Some(tzid) => {
            let Ok(tz) = tzid.parse::<chrono_tz::Tz>() else {
                debug!("Unknown TZID {:?}, leaving time unset", tzid);
                return None;
            };
            tz.from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        }
        None => Some(naive.and_utc()),
    }
}
