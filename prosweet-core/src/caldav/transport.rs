//! The boundary between the CalDAV client and the network.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};

use crate::error::CalendarResult;

/// HTTP Basic credentials, passed per call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Conditional request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    None,
    /// `If-None-Match: *`: only create, never overwrite.
    IfNoneMatchAny,
    /// `If-Match: {etag}`: only overwrite this exact version.
    IfMatch(String),
}

/// A single request against a calendar resource.
#[derive(Debug, Clone)]
pub struct DavRequest {
    pub method: Method,
    pub url: String,
    pub precondition: Precondition,
    /// iCalendar body, sent as `text/calendar`.
    pub body: Option<String>,
}

impl DavRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        DavRequest {
            method,
            url: url.into(),
            precondition: Precondition::None,
            body: None,
        }
    }

    pub fn precondition(mut self, precondition: Precondition) -> Self {
        self.precondition = precondition;
        self
    }

    pub fn body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }
}

/// What the client needs back from the server.
#[derive(Debug, Clone)]
pub struct DavResponse {
    pub status: StatusCode,
    pub etag: Option<String>,
    pub body: String,
}

/// Carries requests to a CalDAV server.
///
/// Implementations must bound every request with a timeout and report
/// timeouts and network failures as `CalendarError::Transport`. They never
/// retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: DavRequest, credentials: &Credentials)
    -> CalendarResult<DavResponse>;
}
