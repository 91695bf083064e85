//! Core of the prosweet scheduling assistant.
//!
//! - [`ics`]: the Event Codec, mapping [`CalendarEvent`] to and from
//!   iCalendar VEVENT text
//! - [`caldav`]: the CalDAV Client, with UID collision handling and
//!   ETag-guarded updates
//! - [`command`]: the typed boundary to the natural-language Command Resolver
//! - [`assistant`]: executing resolved commands through the client

pub mod alarm;
pub mod assistant;
pub mod caldav;
pub mod command;
pub mod date_range;
pub mod error;
pub mod event;
pub mod ics;

pub use alarm::{Alarm, AlarmAction, AlarmTrigger};
pub use caldav::{CalDavClient, CalDavConfig, Credentials, UpdateStrategy};
pub use date_range::DateRange;
pub use error::{CalendarError, CalendarResult};
pub use event::CalendarEvent;
