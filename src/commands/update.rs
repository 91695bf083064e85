use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use prosweet_core::assistant::{execute_command, CommandOutcome};
use prosweet_core::command::{parse_user_time, CalendarCommand, EventChanges};

use super::{explain, Session};
use crate::render::Render;

pub async fn run(
    session: &Session,
    uid: String,
    title: Option<String>,
    description: Option<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let changes = EventChanges {
        title,
        description,
        start: start
            .as_deref()
            .map(parse_user_time)
            .transpose()
            .context("Invalid --start")?,
        end: end
            .as_deref()
            .map(parse_user_time)
            .transpose()
            .context("Invalid --end")?,
        alarms: None,
    };

    if changes.is_empty() {
        anyhow::bail!("Nothing to update. Pass --title, --description, --start or --end");
    }

    let outcome = execute_command(
        &session.client,
        &session.credentials,
        CalendarCommand::Update { uid, changes },
    )
    .await
    .map_err(explain)?;

    if let CommandOutcome::Updated { event } = outcome {
        println!("{} {}", "Updated".yellow(), event.render());
    }
    Ok(())
}
