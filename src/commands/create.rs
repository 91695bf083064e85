use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use prosweet_core::command::parse_user_time;
use prosweet_core::{Alarm, AlarmAction, AlarmTrigger, CalendarEvent};

use super::{explain, Session};
use crate::render::Render;

pub async fn run(
    session: &Session,
    title: String,
    start: String,
    end: String,
    description: Option<String>,
    uid: Option<String>,
    alarms: Vec<String>,
) -> Result<()> {
    let start = parse_user_time(&start).context("Invalid --start")?;
    let end = parse_user_time(&end).context("Invalid --end")?;

    let alarms = alarms
        .iter()
        .map(|trigger| parse_alarm(trigger, &title))
        .collect::<Result<Vec<_>>>()?;

    let event = CalendarEvent {
        uid,
        description,
        alarms,
        ..CalendarEvent::new(title, start, end)
    };

    let created = session
        .client
        .create_event(&session.credentials, event)
        .await
        .map_err(explain)?;

    println!("{} {}", "Created".green(), created.render());
    Ok(())
}

/// A display alarm reminding of `title`.
fn parse_alarm(trigger: &str, title: &str) -> Result<Alarm> {
    let trigger: AlarmTrigger = trigger.parse().map_err(anyhow::Error::msg)?;
    Ok(Alarm {
        action: AlarmAction::Display,
        trigger,
        description: Some(title.to_string()),
    })
}
