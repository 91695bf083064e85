//! The boundary to the Command Resolver: the typed commands it produces and
//! the function-calling schema used to obtain them from a language model.
//!
//! The resolver itself (prompting, model choice) lives outside this crate and
//! is reached through the [`CommandResolver`] trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::alarm::Alarm;
use crate::error::{CalendarError, CalendarResult};
use crate::event::CalendarEvent;

/// A calendar operation chosen by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarCommand {
    Create {
        title: String,
        description: Option<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        alarms: Vec<Alarm>,
    },
    Update {
        uid: String,
        changes: EventChanges,
    },
    Delete {
        uid: String,
    },
}

/// Fields to change on an existing event. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub alarms: Option<Vec<Alarm>>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        *self == EventChanges::default()
    }

    /// Overlay these changes on `event`.
    pub fn apply(self, mut event: CalendarEvent) -> CalendarEvent {
        if let Some(title) = self.title {
            event.summary = Some(title);
        }
        if let Some(description) = self.description {
            event.description = Some(description);
        }
        if let Some(start) = self.start {
            event.start = Some(start);
        }
        if let Some(end) = self.end {
            event.end = Some(end);
        }
        if let Some(alarms) = self.alarms {
            event.alarms = alarms;
        }
        event
    }
}

/// What the resolver made of a user request.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Command(CalendarCommand),
    /// No command applies; show this text to the user.
    Reply(String),
}

/// Maps a natural-language request to a [`Resolution`].
#[async_trait]
pub trait CommandResolver: Send + Sync {
    async fn resolve(
        &self,
        user_text: &str,
        current_events: &[CalendarEvent],
        today: NaiveDate,
    ) -> CalendarResult<Resolution>;
}

pub const CREATE_EVENT: &str = "create_event";
pub const UPDATE_EVENT: &str = "update_event";
pub const DELETE_EVENT: &str = "delete_event";

/// A function call emitted by a language model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default, alias = "arguments")]
    pub args: serde_json::Value,
}

#[derive(Deserialize)]
struct CreateArgs {
    #[serde(alias = "name")]
    title: String,
    #[serde(default)]
    description: Option<String>,
    start_time: String,
    end_time: String,
    #[serde(default)]
    alarms: Vec<Alarm>,
}

#[derive(Deserialize)]
struct UpdateArgs {
    event_uid: String,
    #[serde(default, alias = "name")]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    alarms: Option<Vec<Alarm>>,
}

#[derive(Deserialize)]
struct DeleteArgs {
    event_uid: String,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: serde_json::Value) -> Self {
        FunctionCall {
            name: name.into(),
            args,
        }
    }

    /// Convert the call into a typed command, validating its arguments.
    pub fn into_command(self) -> CalendarResult<CalendarCommand> {
        match self.name.as_str() {
            CREATE_EVENT => {
                let args: CreateArgs = parse_args(&self.name, self.args)?;
                Ok(CalendarCommand::Create {
                    title: args.title,
                    description: args.description,
                    start: parse_user_time(&args.start_time)?,
                    end: parse_user_time(&args.end_time)?,
                    alarms: args.alarms,
                })
            }
            UPDATE_EVENT => {
                let args: UpdateArgs = parse_args(&self.name, self.args)?;
                let changes = EventChanges {
                    title: args.title,
                    description: args.description,
                    start: args.start_time.as_deref().map(parse_user_time).transpose()?,
                    end: args.end_time.as_deref().map(parse_user_time).transpose()?,
                    alarms: args.alarms,
                };
                Ok(CalendarCommand::Update {
                    uid: non_empty_uid(args.event_uid)?,
                    changes,
                })
            }
            DELETE_EVENT => {
                let args: DeleteArgs = parse_args(&self.name, self.args)?;
                Ok(CalendarCommand::Delete {
                    uid: non_empty_uid(args.event_uid)?,
                })
            }
            other => Err(CalendarError::InvalidCommand(format!(
                "Unknown function '{}'",
                other
            ))),
        }
    }
}

fn parse_args<A: serde::de::DeserializeOwned>(
    name: &str,
    args: serde_json::Value,
) -> CalendarResult<A> {
    serde_json::from_value(args)
        .map_err(|e| CalendarError::InvalidCommand(format!("Bad arguments for {}: {}", name, e)))
}

fn non_empty_uid(uid: String) -> CalendarResult<String> {
    let uid = uid.trim().to_string();
    if uid.is_empty() {
        return Err(CalendarError::InvalidCommand("event_uid is empty".into()));
    }
    Ok(uid)
}

/// Parse a user-facing time.
///
/// Accepts RFC 3339 with an offset, or `YYYY-MM-DDTHH:MM[:SS]` without one,
/// which is read as UTC.
pub fn parse_user_time(value: &str) -> CalendarResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc).trunc_subsecs(0));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|dt| dt.and_utc())
        .ok_or_else(|| CalendarError::InvalidCommand(format!("Invalid date/time: {}", value)))
}

/// Function declarations describing the three commands, in the JSON-schema
/// shape function-calling models expect.
pub fn function_declarations() -> serde_json::Value {
    let alarms = json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "action": {"type": "string", "description": "DISPLAY, AUDIO or EMAIL"},
                "trigger": {"type": "string", "description": "ISO 8601 duration relative to the start, e.g. -PT10M"},
                "description": {"type": "string"}
            },
            "required": ["action", "trigger"]
        }
    });

    json!([
        {
            "name": CREATE_EVENT,
            "description": "Creates a new event in the user's calendar.",
            "parameters": {
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "description": {"type": "string"},
                    "start_time": {"type": "string", "description": "YYYY-MM-DDTHH:MM:SS"},
                    "end_time": {"type": "string", "description": "YYYY-MM-DDTHH:MM:SS"},
                    "alarms": alarms
                },
                "required": ["title", "start_time", "end_time"]
            }
        },
        {
            "name": UPDATE_EVENT,
            "description": "Updates an existing event. Only the given fields change.",
            "parameters": {
                "type": "object",
                "properties": {
                    "event_uid": {"type": "string"},
                    "title": {"type": "string"},
                    "description": {"type": "string"},
                    "start_time": {"type": "string", "description": "YYYY-MM-DDTHH:MM:SS"},
                    "end_time": {"type": "string", "description": "YYYY-MM-DDTHH:MM:SS"},
                    "alarms": alarms
                },
                "required": ["event_uid"]
            }
        },
        {
            "name": DELETE_EVENT,
            "description": "Deletes an existing event from the user's calendar.",
            "parameters": {
                "type": "object",
                "properties": {
                    "event_uid": {"type": "string"}
                },
                "required": ["event_uid"]
            }
        }
    ])
}
