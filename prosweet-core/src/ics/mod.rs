//! Event Codec: iCalendar (RFC 5545) encoding and decoding of events.
//!
//! Times always travel in the UTC basic form `YYYYMMDDTHHMMSSZ`.

mod generate;
mod parse;

use chrono::{DateTime, NaiveDateTime, Utc};

pub use generate::{encode_event, encode_event_at};
pub use parse::{decode_event, decode_events};

pub(crate) const ICS_UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Format an instant in the compact UTC form used on the wire.
pub fn format_ics_utc(dt: &DateTime<Utc>) -> String {
    dt.format(ICS_UTC_FORMAT).to_string()
}

/// Parse the compact UTC form. Returns `None` for anything else.
pub fn parse_ics_utc(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim().strip_suffix('Z')?;
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
        .ok()
        .map(|dt| dt.and_utc())
}
