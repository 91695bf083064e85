//! `Transport` over HTTP using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, ETAG, IF_MATCH, IF_NONE_MATCH};

use crate::caldav::transport::{Credentials, DavRequest, DavResponse, Precondition, Transport};
use crate::error::{CalendarError, CalendarResult};

const CALENDAR_MIME: &str = "text/calendar";

/// Production transport: Basic auth, bounded timeout, no automatic retries.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> CalendarResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CalendarError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: DavRequest,
        credentials: &Credentials,
    ) -> CalendarResult<DavResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .basic_auth(&credentials.username, Some(&credentials.password));

        builder = match request.precondition {
            Precondition::None => builder,
            Precondition::IfNoneMatchAny => builder.header(IF_NONE_MATCH, "*"),
            Precondition::IfMatch(etag) => builder.header(IF_MATCH, etag),
        };

        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, CALENDAR_MIME).body(body);
        }

        let response = builder.send().await?;

        let status = response.status();
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.text().await?;

        Ok(DavResponse { status, etag, body })
    }
}
