//! Time windows for listing events and scheduling alarms.

use chrono::{DateTime, Utc};

use crate::event::CalendarEvent;

/// A window of time. `None` means unbounded in that direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        DateRange { from, to }
    }

    /// Everything.
    pub fn unbounded() -> Self {
        DateRange::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }

    /// Whether the event's `[start, end)` interval touches this window.
    ///
    /// An event missing a time is kept, since there is nothing to compare.
    pub fn overlaps(&self, event: &CalendarEvent) -> bool {
        let (Some(start), Some(end)) = (event.start, event.end) else {
            return true;
        };
        self.from.is_none_or(|from| end > from) && self.to.is_none_or(|to| start <= to)
    }
}
