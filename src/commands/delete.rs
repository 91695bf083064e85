use anyhow::Result;
use owo_colors::OwoColorize;

use super::{explain, Session};

pub async fn run(session: &Session, uid: &str) -> Result<()> {
    session
        .client
        .delete_event(&session.credentials, uid)
        .await
        .map_err(explain)?;

    println!("{} {}", "Deleted".red(), uid);
    Ok(())
}
