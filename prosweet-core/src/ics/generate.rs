//! ICS generation.

use chrono::{DateTime, Utc};
use icalendar::{Alarm, Calendar, Component, EventLike, Property, Trigger, ValueType};

use crate::alarm::{self, AlarmTrigger};
use crate::error::CalendarResult;
use crate::event::CalendarEvent;
use crate::ics::format_ics_utc;

const PRODID: &str = "-//ProSweet Planner//EN";

/// Encode an event as a complete VCALENDAR document, stamped with the current
/// time.
pub fn encode_event(event: &CalendarEvent) -> CalendarResult<String> {
    encode_event_at(event, Utc::now())
}

/// Encode an event as a complete VCALENDAR document with an explicit DTSTAMP.
///
/// The output depends only on the event and `dtstamp`. Fails with
/// `InvalidEvent` when the UID or summary is empty or `start >= end`.
pub fn encode_event_at(event: &CalendarEvent, dtstamp: DateTime<Utc>) -> CalendarResult<String> {
    let (start, end) = event.validate()?;

    let mut cal = Calendar::new();

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(event.uid_str());
    ics_event.add_property("DTSTAMP", format_ics_utc(&dtstamp));
    ics_event.summary(event.summary.as_deref().unwrap_or_default());
    ics_event.description(event.description.as_deref().unwrap_or_default());
    ics_event.add_property("DTSTART", format_ics_utc(&start));
    ics_event.add_property("DTEND", format_ics_utc(&end));
    ics_event.add_property("STATUS", "CONFIRMED");
    ics_event.add_property("SEQUENCE", event.sequence.to_string());

    for reminder in &event.alarms {
        let description = reminder.description.as_deref().unwrap_or_default();
        let placeholder = Trigger::before_start(chrono::Duration::zero());
        let mut ics_alarm = Alarm::display(description, placeholder);
        ics_alarm.add_property("ACTION", reminder.action.as_ics_str());
        ics_alarm.append_property(trigger_property(&reminder.trigger));
        ics_event.alarm(ics_alarm);
    }

    cal.push(ics_event.done());
    let cal = cal.done();

    Ok(normalize_output(&cal.to_string()))
}

fn trigger_property(trigger: &AlarmTrigger) -> Property {
    match trigger {
        AlarmTrigger::Relative(offset) => {
            Property::new("TRIGGER", alarm::format_ics_duration(*offset))
        }
        AlarmTrigger::Absolute(at) => {
            let mut prop = Property::new("TRIGGER", format_ics_utc(at));
            prop.append_parameter(ValueType::DateTime);
            prop
        }
    }
}

/// Rewrite the icalendar crate's output into the wire form: our PRODID, no
/// CALSCALE (GREGORIAN is implied), no UID/DTSTAMP inside VALARM, CRLF endings.
fn normalize_output(ics: &str) -> String {
    let mut open: Vec<&str> = Vec::new();

    ics.lines()
        .filter_map(|line| {
            if let Some(name) = line.strip_prefix("BEGIN:") {
                open.push(name);
            } else if line.starts_with("END:") {
                open.pop();
            }
            rewrite_line(open.last().copied(), line)
        })
        .fold(String::with_capacity(ics.len()), |mut out, line| {
            out.push_str(&line);
            out.push_str("\r\n");
            out
        })
}

/// The line to emit for `line` inside `component`, or `None` to drop it.
fn rewrite_line(component: Option<&str>, line: &str) -> Option<String> {
    let name = line.split([':', ';']).next().unwrap_or_default();
    match (component, name) {
        (Some("VCALENDAR"), "PRODID") => Some(format!("PRODID:{}", PRODID)),
        (Some("VCALENDAR"), "CALSCALE") => None,
        (Some("VALARM"), "UID" | "DTSTAMP") => None,
        _ => Some(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{Alarm as EventAlarm, AlarmAction};
    use crate::error::CalendarError;
    use chrono::{Duration, TimeZone};

    fn make_test_event() -> CalendarEvent {
        CalendarEvent::new(
            "Yoga",
            Utc.with_ymd_and_hms(2025, 10, 26, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 10, 26, 8, 0, 0).unwrap(),
        )
        .with_uid("abc123")
        .with_description("Morning session")
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 25, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_encode_has_required_fields() {
        let ics = encode_event_at(&make_test_event(), stamp()).unwrap();

        for expected in [
            "BEGIN:VCALENDAR",
            "BEGIN:VEVENT",
            "UID:abc123",
            "DTSTAMP:20251025T120000Z",
            "SUMMARY:Yoga",
            "DESCRIPTION:Morning session",
            "DTSTART:20251026T070000Z",
            "DTEND:20251026T080000Z",
            "STATUS:CONFIRMED",
            "SEQUENCE:0",
            "END:VEVENT",
            "END:VCALENDAR",
        ] {
            assert!(
                ics.lines().any(|l| l == expected),
                "Missing line {:?}. ICS:\n{}",
                expected,
                ics
            );
        }
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
    }

    #[test]
    fn test_normalize_output_scopes_by_component() {
        let raw = "BEGIN:VCALENDAR\nPRODID:ICALENDAR-RS\nCALSCALE:GREGORIAN\n\
                   BEGIN:VEVENT\nUID:abc123\nDTSTAMP:20251025T120000Z\n\
                   BEGIN:VALARM\nUID:alarm-uid\nDTSTAMP:20251025T120000Z\nACTION:DISPLAY\n\
                   END:VALARM\nEND:VEVENT\nEND:VCALENDAR\n";

        let out = normalize_output(raw);

        assert_eq!(
            out,
            "BEGIN:VCALENDAR\r\nPRODID:-//ProSweet Planner//EN\r\n\
             BEGIN:VEVENT\r\nUID:abc123\r\nDTSTAMP:20251025T120000Z\r\n\
             BEGIN:VALARM\r\nACTION:DISPLAY\r\n\
             END:VALARM\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n",
            "Event-level UID/DTSTAMP must survive; alarm-level ones must not"
        );
    }

    #[test]
    fn test_encode_uses_crlf() {
        let ics = encode_event_at(&make_test_event(), stamp()).unwrap();
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert_eq!(
            ics.matches('\n').count(),
            ics.matches("\r\n").count(),
            "Every line must end with CRLF. ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_encode_is_deterministic_for_fixed_stamp() {
        let event = make_test_event();
        assert_eq!(
            encode_event_at(&event, stamp()).unwrap(),
            encode_event_at(&event, stamp()).unwrap()
        );
    }

    #[test]
    fn test_encode_emits_sequence() {
        let mut event = make_test_event();
        event.sequence = 3;
        let ics = encode_event_at(&event, stamp()).unwrap();
        assert!(ics.contains("SEQUENCE:3\r\n"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_encode_rejects_empty_interval() {
        let mut event = make_test_event();
        event.end = event.start;
        assert!(matches!(
            encode_event_at(&event, stamp()),
            Err(CalendarError::InvalidEvent(_))
        ));
    }

    #[test]
    fn test_encode_rejects_missing_uid() {
        let mut event = make_test_event();
        event.uid = None;
        assert!(matches!(
            encode_event(&event),
            Err(CalendarError::InvalidEvent(_))
        ));
    }

    #[test]
    fn test_encode_alarm_is_minimal() {
        let event = make_test_event()
            .with_alarm(EventAlarm::display_before(Duration::minutes(10), "Starts in 10 minutes"));

        let ics = encode_event_at(&event, stamp()).unwrap();

        let valarm_section: String = ics
            .split("BEGIN:VALARM")
            .nth(1)
            .unwrap()
            .split("END:VALARM")
            .next()
            .unwrap()
            .to_string();
        assert!(valarm_section.contains("ACTION:DISPLAY"), "Got:\n{}", valarm_section);
        assert!(valarm_section.contains("TRIGGER"), "Got:\n{}", valarm_section);
        assert!(valarm_section.contains(":-PT10M"), "Got:\n{}", valarm_section);
        assert!(
            valarm_section.contains("DESCRIPTION:Starts in 10 minutes"),
            "Got:\n{}",
            valarm_section
        );
        assert!(!valarm_section.contains("UID:"), "Got:\n{}", valarm_section);
        assert!(!valarm_section.contains("DTSTAMP:"), "Got:\n{}", valarm_section);
    }

    #[test]
    fn test_encode_alarm_actions_in_order() {
        let start = make_test_event().start.unwrap();
        let event = make_test_event()
            .with_alarm(EventAlarm {
                action: AlarmAction::Audio,
                trigger: AlarmTrigger::Relative(Duration::minutes(-5)),
                description: None,
            })
            .with_alarm(EventAlarm {
                action: AlarmAction::Email,
                trigger: AlarmTrigger::Absolute(start - Duration::hours(1)),
                description: Some("Heads up".into()),
            });

        let ics = encode_event_at(&event, stamp()).unwrap();

        assert_eq!(ics.matches("BEGIN:VALARM").count(), 2, "ICS:\n{}", ics);
        let audio = ics.find("ACTION:AUDIO").expect("audio alarm");
        let email = ics.find("ACTION:EMAIL").expect("email alarm");
        assert!(audio < email, "Alarms must keep their order. ICS:\n{}", ics);
        assert!(
            ics.contains("TRIGGER;VALUE=DATE-TIME:20251026T060000Z"),
            "Absolute trigger must carry VALUE=DATE-TIME. ICS:\n{}",
            ics
        );
    }
}
