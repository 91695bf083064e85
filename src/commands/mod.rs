pub mod alarms;
pub mod apply;
pub mod create;
pub mod delete;
pub mod list;
pub mod show;
pub mod update;

use anyhow::{Context, Result};
use prosweet_core::{CalDavClient, CalendarError, Credentials};

use crate::config::ConnectionArgs;

/// A configured client plus the credentials to use with it.
pub struct Session {
    pub client: CalDavClient,
    pub credentials: Credentials,
}

impl Session {
    pub fn open(args: &ConnectionArgs) -> Result<Self> {
        let settings = args.load()?;
        let client =
            CalDavClient::connect(settings.caldav.clone()).context("Failed to set up HTTP client")?;
        let credentials = settings.credentials()?;
        Ok(Session {
            client,
            credentials,
        })
    }
}

/// Attach a hint for the errors a user can act on.
pub fn explain(error: CalendarError) -> anyhow::Error {
    let hint = match &error {
        CalendarError::Auth(_) => Some("Check the username and PROSWEET_PASSWORD."),
        CalendarError::Conflict { .. } => {
            Some("The event changed on the server. Run `prosweet show` and try again.")
        }
        CalendarError::PreconditionUnavailable(_) => {
            Some("The server does not report ETags. Use --update-strategy delete-and-recreate.")
        }
        _ => None,
    };

    match hint {
        Some(hint) => anyhow::Error::new(error).context(hint),
        None => anyhow::Error::new(error),
    }
}
