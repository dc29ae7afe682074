//! The outbound-call primitive.
//!
//! # Design
//! Code under test never talks to the network directly; it calls
//! `mockwire_core::fetch`, which forwards to whatever `Fetch` implementation
//! is currently installed. Out of the box that is `NetworkFetch`, a thin
//! `ureq` executor. The interceptor swaps in its own implementation and
//! keeps `NetworkFetch` (or whatever was there before) as the original.
//!
//! `ureq` is blocking, so inside a tokio runtime `NetworkFetch` runs each
//! request on the blocking pool. Polled from any other executor it runs the
//! request inline on the polling thread.

use futures::future::BoxFuture;

use crate::error::FetchError;
use crate::http::{canonical_reason, Headers, Request, Response};

/// Anything that can answer an outbound call.
pub trait Fetch: Send + Sync {
    fn fetch(&self, request: Request) -> BoxFuture<'static, Result<Response, FetchError>>;
}

/// Real network primitive backed by a `ureq` agent.
///
/// 4xx/5xx answers are returned as data rather than `Err`, so the
/// interceptor can read the registry endpoint's transport statuses.
#[derive(Clone)]
pub struct NetworkFetch {
    agent: ureq::Agent,
}

impl Default for NetworkFetch {
    fn default() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl NetworkFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Fetch for NetworkFetch {
    fn fetch(&self, request: Request) -> BoxFuture<'static, Result<Response, FetchError>> {
        let agent = self.agent.clone();
        Box::pin(async move {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => handle
                    .spawn_blocking(move || execute(&agent, request))
                    .await
                    .map_err(|e| FetchError::Transport(e.to_string()))?,
                Err(_) => execute(&agent, request),
            }
        })
    }
}

/// Execute a `Request` with ureq and return a `Response`.
fn execute(agent: &ureq::Agent, request: Request) -> Result<Response, FetchError> {
    let mut builder = ::http::Request::builder()
        .method(request.method.as_str())
        .uri(request.url.as_str());
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let sent = match request.body {
        Some(body) => builder.body(body).map(|r| agent.run(r)),
        None => builder.body(()).map(|r| agent.run(r)),
    };
    let mut response = sent
        .map_err(|e| FetchError::Build(e.to_string()))?
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let headers: Headers = response
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();
    let bytes = response
        .body_mut()
        .read_to_vec()
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    Ok(Response {
        status,
        status_text: canonical_reason(status).to_string(),
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}
