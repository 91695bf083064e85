use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use prosweet_core::DateRange;
use prosweet_core::command::parse_user_time;

use super::{explain, Session};
use crate::render::Render;
use crate::utils::spinner::create_spinner;

pub async fn run(session: &Session, from: Option<&str>, to: Option<&str>) -> Result<()> {
    let range = DateRange::new(
        from.map(parse_user_time)
            .transpose()
            .context("Invalid --from")?,
        to.map(parse_user_time).transpose().context("Invalid --to")?,
    );

    let spinner = create_spinner("Fetching events...");
    let fetched = session
        .client
        .list_events_in(&session.credentials, range)
        .await;
    spinner.finish_and_clear();

    let mut events = fetched.into_result().map_err(explain)?;
    events.sort_by_key(|event| event.start);

    if events.is_empty() {
        println!("{}", "No events.".dimmed());
        return Ok(());
    }

    for event in &events {
        println!("{}", event.render());
    }

    Ok(())
}
