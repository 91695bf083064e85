//! In-memory CalDAV server used as a test double for the client.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use prosweet_core::caldav::{Credentials, DavRequest, DavResponse, Precondition, Transport};
use prosweet_core::{CalDavClient, CalDavConfig, CalendarError, CalendarResult};
use reqwest::{Method, StatusCode};

pub const BASE_URL: &str = "http://localhost:5232";
pub const CALENDAR_ID: &str = "aa5e311e-00e3-5874-0b59-e4cb9e1dfd32";

pub fn credentials() -> Credentials {
    Credentials::new("test", "test")
}

pub fn config() -> CalDavConfig {
    CalDavConfig::new(BASE_URL, CALENDAR_ID)
}

pub fn client() -> CalDavClient<MemoryServer> {
    CalDavClient::new(MemoryServer::default(), config())
}

pub fn event_url(uid: &str) -> String {
    config().event_url(&credentials().username, uid)
}

#[derive(Debug, Clone)]
struct Resource {
    body: String,
    etag: String,
}

#[derive(Default)]
struct State {
    resources: BTreeMap<String, Resource>,
    next_etag: u64,
    requests: Vec<DavRequest>,
    /// Answer this many upcoming PUTs with 412 regardless of state.
    forced_put_conflicts: usize,
    /// Answer every request with this status.
    forced_status: Option<StatusCode>,
    omit_etags: bool,
    offline: bool,
}

impl State {
    fn fresh_etag(&mut self) -> String {
        self.next_etag += 1;
        format!("\"{}\"", self.next_etag)
    }
}

/// Minimal CalDAV server honouring `If-None-Match: *` and `If-Match`.
#[derive(Default)]
pub struct MemoryServer {
    state: Mutex<State>,
}

impl MemoryServer {
    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Store a resource directly, as if another client had written it.
    pub fn insert(&self, url: &str, body: &str) -> String {
        let mut state = self.state();
        let etag = state.fresh_etag();
        state.resources.insert(
            url.to_string(),
            Resource {
                body: body.to_string(),
                etag: etag.clone(),
            },
        );
        etag
    }

    /// Simulate a concurrent edit by another client: same body, new ETag.
    pub fn touch(&self, url: &str) {
        let mut state = self.state();
        let etag = state.fresh_etag();
        if let Some(resource) = state.resources.get_mut(url) {
            resource.etag = etag;
        }
    }

    pub fn body(&self, url: &str) -> Option<String> {
        self.state().resources.get(url).map(|r| r.body.clone())
    }

    pub fn etag(&self, url: &str) -> Option<String> {
        self.state().resources.get(url).map(|r| r.etag.clone())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.state().resources.contains_key(url)
    }

    pub fn resource_count(&self) -> usize {
        self.state().resources.len()
    }

    pub fn force_put_conflicts(&self, count: usize) {
        self.state().forced_put_conflicts = count;
    }

    pub fn force_status(&self, status: StatusCode) {
        self.state().forced_status = Some(status);
    }

    pub fn omit_etags(&self) {
        self.state().omit_etags = true;
    }

    pub fn go_offline(&self) {
        self.state().offline = true;
    }

    pub fn requests(&self) -> Vec<DavRequest> {
        self.state().requests.clone()
    }

    pub fn requests_with(&self, method: Method) -> Vec<DavRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state().requests.clear();
    }
}

fn respond(status: StatusCode, etag: Option<String>, body: impl Into<String>) -> DavResponse {
    DavResponse {
        status,
        etag,
        body: body.into(),
    }
}

/// The VEVENT span of a stored document.
fn vevent_span(body: &str) -> &str {
    let start = body.find("BEGIN:VEVENT").unwrap_or(0);
    let end = body
        .find("END:VEVENT")
        .map(|i| i + "END:VEVENT\r\n".len())
        .unwrap_or(body.len())
        .min(body.len());
    &body[start..end]
}

#[async_trait]
impl Transport for MemoryServer {
    async fn send(
        &self,
        request: DavRequest,
        credentials: &Credentials,
    ) -> CalendarResult<DavResponse> {
        let mut state = self.state();
        state.requests.push(request.clone());

        if state.offline {
            return Err(CalendarError::Transport("connection refused".into()));
        }
        if let Some(status) = state.forced_status {
            return Ok(respond(status, None, "forced"));
        }
        if credentials.password.is_empty() {
            return Ok(respond(StatusCode::UNAUTHORIZED, None, "missing credentials"));
        }

        let url = request.url.clone();
        let existing = state.resources.get(&url).cloned();
        let visible_etag =
            |etag: &str, state: &State| (!state.omit_etags).then(|| etag.to_string());

        match request.method {
            Method::GET if url.ends_with('/') => {
                let mut body =
                    String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Memory//EN\r\n");
                let members = state
                    .resources
                    .range(url.clone()..)
                    .take_while(|(key, _)| key.starts_with(&url));
                for (_, resource) in members {
                    body.push_str(vevent_span(&resource.body));
                }
                body.push_str("END:VCALENDAR\r\n");
                Ok(respond(StatusCode::OK, None, body))
            }
            Method::GET => match existing {
                Some(resource) => Ok(respond(
                    StatusCode::OK,
                    visible_etag(&resource.etag, &*state),
                    resource.body,
                )),
                None => Ok(respond(StatusCode::NOT_FOUND, None, "")),
            },
            Method::HEAD => match existing {
                Some(resource) => Ok(respond(
                    StatusCode::OK,
                    visible_etag(&resource.etag, &*state),
                    "",
                )),
                None => Ok(respond(StatusCode::NOT_FOUND, None, "")),
            },
            Method::PUT => {
                if state.forced_put_conflicts > 0 {
                    state.forced_put_conflicts -= 1;
                    return Ok(respond(StatusCode::PRECONDITION_FAILED, None, "exists"));
                }

                let allowed = match (&request.precondition, &existing) {
                    (Precondition::IfNoneMatchAny, Some(_)) => false,
                    (Precondition::IfMatch(_), None) => false,
                    (Precondition::IfMatch(etag), Some(resource)) => *etag == resource.etag,
                    _ => true,
                };
                if !allowed {
                    return Ok(respond(StatusCode::PRECONDITION_FAILED, None, "precondition"));
                }

                let etag = state.fresh_etag();
                let body = request.body.clone().unwrap_or_default();
                state.resources.insert(
                    url,
                    Resource {
                        body,
                        etag: etag.clone(),
                    },
                );
                let status = if existing.is_some() {
                    StatusCode::NO_CONTENT
                } else {
                    StatusCode::CREATED
                };
                let etag = visible_etag(&etag, &*state);
                Ok(respond(status, etag, ""))
            }
            Method::DELETE => match state.resources.remove(&url) {
                Some(_) => Ok(respond(StatusCode::NO_CONTENT, None, "")),
                None => Ok(respond(StatusCode::NOT_FOUND, None, "")),
            },
            _ => Ok(respond(StatusCode::METHOD_NOT_ALLOWED, None, "")),
        }
    }
}
