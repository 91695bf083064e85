//! CalDAV Client: create, read, update and delete single event resources in a
//! calendar collection.
//!
//! Each event lives at `{base_url}/{username}/{calendar_id}/{uid}.ics`. The
//! collection itself (`{base_url}/{username}/{calendar_id}/`) answers GET with
//! every event it holds.

mod client;
mod http;
mod transport;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use client::{CalDavClient, FetchedEvents};
pub use http::HttpTransport;
pub use transport::{Credentials, DavRequest, DavResponse, Precondition, Transport};

/// Default bound on every network round-trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How updates are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// Probe the ETag, then PUT with `If-Match`. Concurrent edits surface as
    /// `Conflict`.
    #[default]
    InPlace,
    /// DELETE the resource, then create it again under the same UID. For
    /// servers without stable ETags; offers no concurrency protection.
    DeleteAndRecreate,
}

/// Where the calendar lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalDavConfig {
    pub base_url: String,
    pub calendar_id: String,
    pub timeout: Duration,
    pub update_strategy: UpdateStrategy,
}

impl CalDavConfig {
    pub fn new(base_url: impl Into<String>, calendar_id: impl Into<String>) -> Self {
        CalDavConfig {
            base_url: base_url.into(),
            calendar_id: calendar_id.into(),
            timeout: DEFAULT_TIMEOUT,
            update_strategy: UpdateStrategy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_update_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.update_strategy = strategy;
        self
    }

    /// URL of the calendar collection for `username`.
    pub fn collection_url(&self, username: &str) -> String {
        format!(
            "{}/{}/{}/",
            self.base_url.trim_end_matches('/'),
            username.trim_matches('/'),
            self.calendar_id.trim_matches('/')
        )
    }

    /// URL of the resource holding event `uid`.
    pub fn event_url(&self, username: &str, uid: &str) -> String {
        format!("{}{}.ics", self.collection_url(username), uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_url() {
        let config = CalDavConfig::new("http://localhost:5232/", "work");
        assert_eq!(
            config.event_url("test", "abc123"),
            "http://localhost:5232/test/work/abc123.ics"
        );
        assert_eq!(
            config.collection_url("test"),
            "http://localhost:5232/test/work/"
        );
    }

    #[test]
    fn test_defaults() {
        let config = CalDavConfig::new("http://localhost:5232", "work");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.update_strategy, UpdateStrategy::InPlace);
    }
}
