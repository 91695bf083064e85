use anyhow::{Context, Result};
use chrono::Utc;
use owo_colors::OwoColorize;
use prosweet_core::alarm::{alarm_window, scheduled_alarms};
use prosweet_core::command::parse_user_time;

use super::{explain, Session};
use crate::render::Render;

pub async fn run(session: &Session, from: Option<&str>, to: Option<&str>) -> Result<()> {
    let from = from
        .map(parse_user_time)
        .transpose()
        .context("Invalid --from")?;
    let to = to.map(parse_user_time).transpose().context("Invalid --to")?;

    let (from, to) = alarm_window(from, to, Utc::now());
    if to < from {
        anyhow::bail!("--to must not be before --from");
    }

    // Relative alarms can fire outside their event's time, so read everything
    let events = session
        .client
        .list_events(&session.credentials)
        .await
        .into_result()
        .map_err(explain)?;

    let scheduled = scheduled_alarms(&events, from, to);
    if scheduled.is_empty() {
        println!("{}", "No alarms in this window.".dimmed());
        return Ok(());
    }

    for entry in scheduled {
        let summary = entry.event.summary.as_deref().unwrap_or("(untitled)");
        println!(
            "{} {} {}",
            entry.at.format("%Y-%m-%d %H:%M UTC").to_string().bold(),
            entry.alarm.render(),
            summary.dimmed()
        );
    }

    Ok(())
}
