//! Carrying out resolved commands against the calendar.
//!
//! One turn of the assistant: fetch the current events, hand them with the
//! user's text to a [`CommandResolver`], and execute whatever it decides.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::caldav::{CalDavClient, Credentials, Transport};
use crate::command::{CalendarCommand, CommandResolver, Resolution};
use crate::error::CalendarResult;
use crate::event::CalendarEvent;

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Created { event: CalendarEvent },
    Updated { event: CalendarEvent },
    Deleted { uid: String },
}

/// Result of one assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Executed(CommandOutcome),
    Reply(String),
}

/// Execute a command.
///
/// Updates fetch the current event first, so unchanged fields, the sequence
/// number and the ETag all come from the server.
pub async fn execute_command<T: Transport>(
    client: &CalDavClient<T>,
    credentials: &Credentials,
    command: CalendarCommand,
) -> CalendarResult<CommandOutcome> {
    match command {
        CalendarCommand::Create {
            title,
            description,
            start,
            end,
            alarms,
        } => {
            let event = CalendarEvent {
                description,
                alarms,
                ..CalendarEvent::new(title, start, end)
            };
            let event = client.create_event(credentials, event).await?;
            Ok(CommandOutcome::Created { event })
        }
        CalendarCommand::Update { uid, changes } => {
            let current = client.fetch_event(credentials, &uid).await?;
            let event = client
                .update_event(credentials, changes.apply(current))
                .await?;
            Ok(CommandOutcome::Updated { event })
        }
        CalendarCommand::Delete { uid } => {
            client.delete_event(credentials, &uid).await?;
            Ok(CommandOutcome::Deleted { uid })
        }
    }
}

/// Run one request through the resolver and execute the result.
///
/// A failed listing does not stop the turn: the resolver sees no events and
/// the failure is logged.
pub async fn run_turn<T: Transport, R: CommandResolver>(
    client: &CalDavClient<T>,
    resolver: &R,
    credentials: &Credentials,
    user_text: &str,
    today: NaiveDate,
) -> CalendarResult<TurnOutcome> {
    let fetched = client.list_events(credentials).await;
    if let Some(error) = fetched.error() {
        warn!("Continuing without current events: {}", error);
    }
    let current: Vec<CalendarEvent> = fetched.events().collect();

    match resolver.resolve(user_text, &current, today).await? {
        Resolution::Command(command) => {
            info!("Resolver chose {:?}", command);
            let outcome = execute_command(client, credentials, command).await?;
            Ok(TurnOutcome::Executed(outcome))
        }
        Resolution::Reply(text) => Ok(TurnOutcome::Reply(text)),
    }
}
