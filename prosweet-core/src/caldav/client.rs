//! Event operations against a single calendar collection.

use reqwest::{Method, StatusCode};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::caldav::http::HttpTransport;
use crate::caldav::transport::{Credentials, DavRequest, DavResponse, Precondition, Transport};
use crate::caldav::{CalDavConfig, UpdateStrategy};
use crate::date_range::DateRange;
use crate::error::{CalendarError, CalendarResult};
use crate::event::CalendarEvent;
use crate::ics::{decode_event, decode_events, encode_event};

/// CalDAV client for one calendar collection.
///
/// Holds no credentials; every operation takes them explicitly.
pub struct CalDavClient<T = HttpTransport> {
    transport: T,
    config: CalDavConfig,
}

impl CalDavClient<HttpTransport> {
    /// Client over HTTP with the configured timeout.
    pub fn connect(config: CalDavConfig) -> CalendarResult<Self> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(CalDavClient::new(transport, config))
    }
}

/// Outcome of a create-only PUT.
enum CreateOutcome {
    Written { etag: Option<String> },
    /// Something already lives at the address.
    Collision { status: StatusCode, body: String },
}

impl<T: Transport> CalDavClient<T> {
    pub fn new(transport: T, config: CalDavConfig) -> Self {
        CalDavClient { transport, config }
    }

    pub fn config(&self) -> &CalDavConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn send(
        &self,
        request: DavRequest,
        credentials: &Credentials,
    ) -> CalendarResult<DavResponse> {
        debug!(method = %request.method, url = %request.url, "CalDAV request");
        let response = self.transport.send(request, credentials).await?;
        debug!(status = %response.status, etag = ?response.etag, "CalDAV response");
        Ok(response)
    }

    /// Fetch every event in the collection.
    ///
    /// Never fails outright: a failed fetch yields no events and carries the
    /// error for the caller to report.
    pub async fn list_events(&self, credentials: &Credentials) -> FetchedEvents {
        self.list_events_in(credentials, DateRange::unbounded()).await
    }

    /// Fetch the events overlapping `range`.
    ///
    /// The collection is read whole and filtered as it is decoded.
    pub async fn list_events_in(
        &self,
        credentials: &Credentials,
        range: DateRange,
    ) -> FetchedEvents {
        let url = self.config.collection_url(&credentials.username);
        let request = DavRequest::new(Method::GET, &url);

        match self.send(request, credentials).await {
            Ok(response) if response.status.is_success() => {
                FetchedEvents::loaded(response.body, range)
            }
            Ok(response) => {
                let error = read_error(response);
                warn!("Listing {} failed: {}", url, error);
                FetchedEvents::failed(error)
            }
            Err(error) => {
                warn!("Listing {} failed: {}", url, error);
                FetchedEvents::failed(error)
            }
        }
    }

    /// Fetch one event by UID, with its current ETag.
    pub async fn fetch_event(
        &self,
        credentials: &Credentials,
        uid: &str,
    ) -> CalendarResult<CalendarEvent> {
        let url = self.config.event_url(&credentials.username, uid);
        let response = self
            .send(DavRequest::new(Method::GET, url), credentials)
            .await?;

        if is_gone(response.status) {
            return Err(CalendarError::NotFound(uid.to_string()));
        }
        if !response.status.is_success() {
            return Err(read_error(response));
        }

        let mut event = decode_event(&response.body).ok_or_else(|| {
            CalendarError::Serialization(format!("No VEVENT in resource for '{}'", uid))
        })?;
        event.etag = response.etag;
        Ok(event)
    }

    /// Create an event, generating a UID when none is supplied.
    ///
    /// Writes with `If-None-Match: *`. If the address is already taken, one
    /// fresh UID is tried; a second collision is returned as `RemoteWrite`.
    /// Returns the event under the UID the server accepted.
    pub async fn create_event(
        &self,
        credentials: &Credentials,
        mut event: CalendarEvent,
    ) -> CalendarResult<CalendarEvent> {
        if event.uid.as_deref().is_none_or(|uid| uid.trim().is_empty()) {
            event.uid = Some(new_uid());
        }
        event.etag = None;

        let outcome = match self.put_new(credentials, &event).await? {
            CreateOutcome::Collision { status, .. } => {
                let taken = event.uid_str().to_string();
                event.uid = Some(new_uid());
                warn!(
                    "UID {} already exists (status {}), retrying as {}",
                    taken,
                    status,
                    event.uid_str()
                );
                self.put_new(credentials, &event).await?
            }
            written => written,
        };

        match outcome {
            CreateOutcome::Written { etag } => {
                event.etag = etag;
                info!("Created event {}", event.uid_str());
                Ok(event)
            }
            CreateOutcome::Collision { status, body } => {
                Err(CalendarError::RemoteWrite { status, body })
            }
        }
    }

    async fn put_new(
        &self,
        credentials: &Credentials,
        event: &CalendarEvent,
    ) -> CalendarResult<CreateOutcome> {
        let body = encode_event(event)?;
        let url = self.config.event_url(&credentials.username, event.uid_str());
        let request = DavRequest::new(Method::PUT, url)
            .precondition(Precondition::IfNoneMatchAny)
            .body(body);

        let response = self.send(request, credentials).await?;
        let status = response.status;

        if status.is_success() {
            return Ok(CreateOutcome::Written {
                etag: response.etag,
            });
        }
        if status == StatusCode::PRECONDITION_FAILED || status == StatusCode::CONFLICT {
            return Ok(CreateOutcome::Collision {
                status,
                body: response.body,
            });
        }
        Err(write_error(response))
    }

    /// Update an event using the configured [`UpdateStrategy`].
    ///
    /// The returned event carries the incremented sequence number.
    pub async fn update_event(
        &self,
        credentials: &Credentials,
        event: CalendarEvent,
    ) -> CalendarResult<CalendarEvent> {
        match self.config.update_strategy {
            UpdateStrategy::InPlace => self.update_in_place(credentials, event).await,
            UpdateStrategy::DeleteAndRecreate => {
                self.update_by_recreating(credentials, event).await
            }
        }
    }

    /// Conditional in-place update.
    ///
    /// Probes the resource with HEAD for its ETag, then writes with
    /// `If-Match`. If the event already carries an ETag that no longer
    /// matches the server's, fails with `Conflict` before writing. Never
    /// retries: on `Conflict` the caller must re-fetch.
    pub async fn update_in_place(
        &self,
        credentials: &Credentials,
        event: CalendarEvent,
    ) -> CalendarResult<CalendarEvent> {
        let mut updated = event;
        updated.sequence = updated.sequence.saturating_add(1);
        updated.validate()?;

        let uid = updated.uid_str().to_string();
        let url = self.config.event_url(&credentials.username, &uid);

        let probe = self
            .send(DavRequest::new(Method::HEAD, &url), credentials)
            .await?;
        if is_gone(probe.status) {
            return Err(CalendarError::NotFound(uid));
        }
        if !probe.status.is_success() {
            return Err(read_error(probe));
        }

        let Some(current_etag) = probe.etag else {
            return Err(CalendarError::PreconditionUnavailable(uid));
        };

        if let Some(known) = updated.etag.as_deref() {
            if known != current_etag {
                debug!("Stale ETag for {}: have {}, server has {}", uid, known, current_etag);
                return Err(CalendarError::Conflict { uid });
            }
        }

        let body = encode_event(&updated)?;
        let request = DavRequest::new(Method::PUT, &url)
            .precondition(Precondition::IfMatch(current_etag))
            .body(body);
        let response = self.send(request, credentials).await?;

        match response.status {
            status if status.is_success() => {
                updated.etag = response.etag;
                info!("Updated event {} (sequence {})", uid, updated.sequence);
                Ok(updated)
            }
            StatusCode::PRECONDITION_FAILED => Err(CalendarError::Conflict { uid }),
            status if is_gone(status) => Err(CalendarError::NotFound(uid)),
            _ => Err(write_error(response)),
        }
    }

    /// Update by deleting the resource and creating it again with the same
    /// UID. No optimistic-concurrency protection.
    ///
    /// The UID is never regenerated: if another writer recreates the resource
    /// between the DELETE and the PUT, the update fails with `Conflict`.
    pub async fn update_by_recreating(
        &self,
        credentials: &Credentials,
        event: CalendarEvent,
    ) -> CalendarResult<CalendarEvent> {
        let mut updated = event;
        updated.sequence = updated.sequence.saturating_add(1);
        updated.etag = None;
        updated.validate()?;

        let uid = updated.uid_str().to_string();
        self.delete_event(credentials, &uid).await?;

        match self.put_new(credentials, &updated).await? {
            CreateOutcome::Written { etag } => {
                updated.etag = etag;
                info!("Recreated event {} (sequence {})", uid, updated.sequence);
                Ok(updated)
            }
            CreateOutcome::Collision { status, .. } => {
                warn!("Event {} reappeared before it could be recreated (status {})", uid, status);
                Err(CalendarError::Conflict { uid })
            }
        }
    }

    /// Delete an event. Deleting an event that does not exist succeeds.
    pub async fn delete_event(&self, credentials: &Credentials, uid: &str) -> CalendarResult<()> {
        let url = self.config.event_url(&credentials.username, uid);
        let response = self
            .send(DavRequest::new(Method::DELETE, url), credentials)
            .await?;

        if response.status.is_success() {
            info!("Deleted event {}", uid);
            return Ok(());
        }
        if is_gone(response.status) {
            debug!("Event {} already absent", uid);
            return Ok(());
        }
        Err(write_error(response))
    }
}

/// Events fetched from a collection, decoded lazily.
#[derive(Debug)]
pub struct FetchedEvents {
    body: String,
    range: DateRange,
    error: Option<CalendarError>,
}

impl FetchedEvents {
    fn loaded(body: String, range: DateRange) -> Self {
        FetchedEvents {
            body,
            range,
            error: None,
        }
    }

    fn failed(error: CalendarError) -> Self {
        FetchedEvents {
            body: String::new(),
            range: DateRange::unbounded(),
            error: Some(error),
        }
    }

    /// Decode the events one by one. Empty when the fetch failed.
    pub fn events(&self) -> impl Iterator<Item = CalendarEvent> + '_ {
        decode_events(&self.body).filter(|event| self.range.overlaps(event))
    }

    /// Why the fetch failed, if it did.
    pub fn error(&self) -> Option<&CalendarError> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// All events, or the fetch error.
    pub fn into_result(self) -> CalendarResult<Vec<CalendarEvent>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let range = self.range;
        Ok(decode_events(&self.body)
            .filter(|event| range.overlaps(event))
            .collect())
    }
}

fn new_uid() -> String {
    Uuid::new_v4().to_string()
}

fn is_gone(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND || status == StatusCode::GONE
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

fn read_error(response: DavResponse) -> CalendarError {
    if is_auth_failure(response.status) {
        return CalendarError::Auth(response.status);
    }
    CalendarError::RemoteRead {
        status: response.status,
        body: response.body,
    }
}

fn write_error(response: DavResponse) -> CalendarError {
    if is_auth_failure(response.status) {
        return CalendarError::Auth(response.status);
    }
    CalendarError::RemoteWrite {
        status: response.status,
        body: response.body,
    }
}
