use anyhow::Result;

use super::{explain, Session};
use crate::render::render_details;

pub async fn run(session: &Session, uid: &str) -> Result<()> {
    let event = session
        .client
        .fetch_event(&session.credentials, uid)
        .await
        .map_err(explain)?;

    for line in render_details(&event) {
        println!("{}", line);
    }

    Ok(())
}
