//! The calendar event record shared by the codec, the CalDAV client and the
//! command layer.
//!
//! Decoding is lenient, so most fields are optional: an event read from a
//! server may lack anything a server chose to omit. Encoding checks the
//! fields it needs via [`CalendarEvent::validate`].

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::alarm::Alarm;
use crate::error::{CalendarError, CalendarResult};

/// A single VEVENT.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Unique within a calendar collection. `None` for an event that has not
    /// been created yet; the client generates one.
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,

    /// Revision counter (SEQUENCE), incremented on every successful update.
    #[serde(default)]
    pub sequence: u32,

    /// Server-assigned version token. Only used as an update precondition,
    /// never encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alarms: Vec<Alarm>,
}

impl CalendarEvent {
    /// A new event without a UID.
    ///
    /// Times are truncated to whole seconds, the precision of the wire format.
    pub fn new(summary: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        CalendarEvent {
            summary: Some(summary.into()),
            start: Some(start.trunc_subsecs(0)),
            end: Some(end.trunc_subsecs(0)),
            ..Default::default()
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_alarm(mut self, alarm: Alarm) -> Self {
        self.alarms.push(alarm);
        self
    }

    /// The UID, or an empty string when there is none.
    pub fn uid_str(&self) -> &str {
        self.uid.as_deref().unwrap_or_default()
    }

    /// Check that the event can be written: non-empty UID and summary and
    /// `start < end`. Returns the two times on success.
    pub fn validate(&self) -> CalendarResult<(DateTime<Utc>, DateTime<Utc>)> {
        match self.uid.as_deref() {
            Some(uid) if !uid.trim().is_empty() => {}
            _ => return Err(CalendarError::InvalidEvent("uid is empty".into())),
        }

        match self.summary.as_deref() {
            Some(summary) if !summary.trim().is_empty() => {}
            _ => return Err(CalendarError::InvalidEvent("summary is empty".into())),
        }

        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(CalendarError::InvalidEvent(
                "start and end times are required".into(),
            ));
        };

        if start >= end {
            return Err(CalendarError::InvalidEvent(format!(
                "start ({}) must be before end ({})",
                start, end
            )));
        }

        Ok((start, end))
    }

    /// Compare the logical content of two events, ignoring the `etag` and
    /// `sequence` bookkeeping.
    pub fn same_content(&self, other: &CalendarEvent) -> bool {
        self.uid == other.uid
            && self.summary == other.summary
            && self.description == other.description
            && self.start == other.start
            && self.end == other.end
            && self.alarms == other.alarms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_truncates_to_whole_seconds() {
        let start = Utc.with_ymd_and_hms(2025, 10, 26, 7, 0, 0).unwrap();
        let event = CalendarEvent::new(
            "Yoga",
            start + chrono::Duration::milliseconds(500),
            start + chrono::Duration::minutes(60) + chrono::Duration::milliseconds(999),
        )
        .with_uid("abc123");

        assert_eq!(event.start, Some(start));
        assert_eq!(event.end, Some(start + chrono::Duration::minutes(60)));

        let ics = crate::ics::encode_event(&event).unwrap();
        let decoded = crate::ics::decode_event(&ics).unwrap();
        assert!(decoded.same_content(&event), "Wire round trip changed the times");
    }

    fn make_test_event() -> CalendarEvent {
        CalendarEvent::new(
            "Yoga",
            Utc.with_ymd_and_hms(2025, 10, 26, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 10, 26, 8, 0, 0).unwrap(),
        )
        .with_uid("abc123")
    }

    #[test]
    fn valid_event_passes() {
        assert!(make_test_event().validate().is_ok());
    }

    #[test]
    fn equal_start_and_end_is_invalid() {
        let mut event = make_test_event();
        event.end = event.start;
        assert!(matches!(
            event.validate(),
            Err(CalendarError::InvalidEvent(_))
        ));
    }

    #[test]
    fn blank_uid_or_summary_is_invalid() {
        let mut event = make_test_event();
        event.uid = Some("  ".into());
        assert!(matches!(event.validate(), Err(CalendarError::InvalidEvent(_))));

        let mut event = make_test_event();
        event.summary = None;
        assert!(matches!(event.validate(), Err(CalendarError::InvalidEvent(_))));
    }

    #[test]
    fn same_content_ignores_bookkeeping() {
        let a = make_test_event();
        let mut b = a.clone();
        b.sequence = 4;
        b.etag = Some("\"7\"".into());
        assert!(a.same_content(&b));
        assert_ne!(a, b);
    }
}
