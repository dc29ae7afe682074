//! Install/restore of the process-wide outbound-call override.
//!
//! # Design
//! An `Interceptor` owns two slots: the primitive currently answering
//! `fetch`, and the interception state. `install` replaces the primitive
//! with a forwarder that ships every call to the registry endpoint through
//! the saved original; `restore` puts the original back.
//!
//! Invariant: `saved_original` is `Some` if and only if interception is
//! active. A second `install` while active only logs a warning and never
//! re-captures the original, otherwise the real primitive would be lost
//! under a second override layer.
//!
//! The locks exist because statics must be `Sync`. `install` and `restore`
//! are still expected to come from one control thread (test setup and
//! teardown), never racing each other.

use std::sync::Arc;

use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::codec::{self, ErrorPayload};
use crate::config::InterceptorConfig;
use crate::error::FetchError;
use crate::fetch::{Fetch, NetworkFetch};
use crate::http::{OutboundCall, Request, Response};
use crate::policy::{Decision, PolicyEvaluator, UnhandledRequestPolicy};

/// Transport status the registry endpoint uses for "no handler matched".
pub const NO_MATCH_STATUS: u16 = 404;

static GLOBAL: Lazy<Interceptor> = Lazy::new(|| Interceptor::new(Arc::new(NetworkFetch::new())));

#[derive(Default)]
struct InterceptionState {
    saved_original: Option<Arc<dyn Fetch>>,
    policy: Option<UnhandledRequestPolicy>,
}

impl InterceptionState {
    fn active(&self) -> bool {
        self.saved_original.is_some()
    }
}

pub struct Interceptor {
    primitive: RwLock<Arc<dyn Fetch>>,
    state: Mutex<InterceptionState>,
}

impl Interceptor {
    /// An interceptor whose un-intercepted primitive is `primitive`.
    pub fn new(primitive: Arc<dyn Fetch>) -> Self {
        Self {
            primitive: RwLock::new(primitive),
            state: Mutex::new(InterceptionState::default()),
        }
    }

    /// The process-wide interceptor behind `mockwire_core::fetch`.
    pub fn global() -> &'static Interceptor {
        &GLOBAL
    }

    pub fn install(&self, config: InterceptorConfig) {
        let mut state = self.state.lock();
        if state.active() {
            warn!(
                "interception is already installed; be sure to only install it once. \
                 Call restore() first to reinstall with a different configuration"
            );
            return;
        }

        let mut primitive = self.primitive.write();
        let original = Arc::clone(&primitive);
        let endpoint_url = config.endpoint_url();
        debug!(
            endpoint = %endpoint_url,
            policy = config.on_unhandled_request.name(),
            "installing outbound-call interception"
        );
        *primitive = Arc::new(Forwarder {
            original: Arc::clone(&original),
            endpoint_url,
            evaluator: PolicyEvaluator::new(config.on_unhandled_request.clone()),
        });
        state.saved_original = Some(original);
        state.policy = Some(config.on_unhandled_request);
    }

    /// Put the original primitive back. No-op when not installed.
    pub fn restore(&self) {
        let mut state = self.state.lock();
        if let Some(original) = state.saved_original.take() {
            *self.primitive.write() = original;
            state.policy = None;
            debug!("restored original outbound-call primitive");
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active()
    }

    /// Policy fixed by the current `install`, if any.
    pub fn policy(&self) -> Option<UnhandledRequestPolicy> {
        self.state.lock().policy.clone()
    }

    /// The primitive currently answering calls.
    pub fn primitive(&self) -> Arc<dyn Fetch> {
        Arc::clone(&self.primitive.read())
    }

    pub async fn fetch(&self, request: Request) -> Result<Response, FetchError> {
        let primitive = self.primitive();
        primitive.fetch(request).await
    }
}

/// Install interception on the global interceptor.
pub fn install(config: InterceptorConfig) {
    GLOBAL.install(config)
}

/// Restore the global interceptor's original primitive.
pub fn restore() {
    GLOBAL.restore()
}

/// The outbound-call entry point for code under test.
///
/// Runtime-agnostic: with no tokio runtime on the polling thread the real
/// network call blocks that thread instead of moving to tokio's blocking pool.
pub async fn fetch(request: Request) -> Result<Response, FetchError> {
    GLOBAL.fetch(request).await
}

/// Replacement primitive installed while interception is active.
struct Forwarder {
    original: Arc<dyn Fetch>,
    endpoint_url: String,
    evaluator: PolicyEvaluator,
}

impl Fetch for Forwarder {
    fn fetch(&self, request: Request) -> BoxFuture<'static, Result<Response, FetchError>> {
        let original = Arc::clone(&self.original);
        let endpoint_url = self.endpoint_url.clone();
        let evaluator = self.evaluator.clone();
        Box::pin(async move { forward(original, &endpoint_url, &evaluator, request).await })
    }
}

async fn forward(
    original: Arc<dyn Fetch>,
    endpoint_url: &str,
    evaluator: &PolicyEvaluator,
    request: Request,
) -> Result<Response, FetchError> {
    let call = OutboundCall::from_request(&request);
    let envelope = codec::encode_call(&call);
    debug!(method = %call.method(), url = call.url(), "forwarding intercepted call");

    // Always through the original: going through `fetch` would recurse.
    let forwarded = Request::post(endpoint_url).json(&envelope)?;
    let answer = original.fetch(forwarded).await?;

    match answer.status {
        200 => Ok(codec::decode_response_bytes(answer.body.as_bytes())?),
        NO_MATCH_STATUS => match evaluator.resolve(&call) {
            Decision::FallThrough => {
                warn!(
                    "No handler found for request:\nURL: {}\nMethod: {}",
                    call.url(),
                    call.method()
                );
                // The no-match payload has no status or body, so this
                // decodes to an empty 200.
                Ok(codec::decode_response_bytes(answer.body.as_bytes())?)
            }
            Decision::Raise(err) => Err(err),
            Decision::DelegateToOriginal => original.fetch(request).await,
            Decision::Respond(custom) => custom.respond(call).await.map_err(FetchError::Policy),
        },
        status => Ok(transport_failure(status, &answer.body)),
    }
}

/// Generic failure response for a 400/500 from the registry endpoint.
fn transport_failure(status: u16, body: &str) -> Response {
    let message = serde_json::from_str::<ErrorPayload>(body)
        .map(|p| p.error)
        .unwrap_or_else(|_| body.to_string());
    Response::text(status, &message)
}
