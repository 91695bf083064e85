use std::io::Read;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use prosweet_core::assistant::{execute_command, CommandOutcome};
use prosweet_core::command::FunctionCall;

use super::{explain, Session};
use crate::render::Render;

/// Execute a function call, e.g.
/// `{"name": "delete_event", "args": {"event_uid": "abc123"}}`.
pub async fn run(session: &Session, call: &str) -> Result<()> {
    let json = if call == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read function call from stdin")?;
        buf
    } else {
        call.to_string()
    };

    let call: FunctionCall =
        serde_json::from_str(&json).context("Function call is not valid JSON")?;
    let command = call.into_command().map_err(explain)?;

    let outcome = execute_command(&session.client, &session.credentials, command)
        .await
        .map_err(explain)?;

    match outcome {
        CommandOutcome::Created { event } => println!("{} {}", "Created".green(), event.render()),
        CommandOutcome::Updated { event } => println!("{} {}", "Updated".yellow(), event.render()),
        CommandOutcome::Deleted { uid } => println!("{} {}", "Deleted".red(), uid),
    }
    Ok(())
}
