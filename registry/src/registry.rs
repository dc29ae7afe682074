//! Ordered handler registry.
//!
//! # Design
//! Entries are kept in registration order and matched first-match-wins:
//! when two handlers both match a call, the earlier one answers, regardless
//! of which matcher is "more specific". There is no per-entry removal; the
//! only way to drop handlers is `clear`.
//!
//! `HandlerRegistry` is a cheap `Clone` handle. Test code registers through
//! one clone while the endpoint dispatches through another. The lock is held
//! only to find the entry, never while a responder runs. Registering or
//! clearing while calls are in flight is the caller's responsibility.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use mockwire_core::{BoxError, Method, OutboundCall, Response};
use parking_lot::RwLock;

use crate::matcher::UrlMatcher;

/// Produces the mocked response for a matched call.
pub trait Responder: Send + Sync {
    fn respond(&self, call: OutboundCall) -> BoxFuture<'static, Result<Response, BoxError>>;
}

impl<F, Fut> Responder for F
where
    F: Fn(OutboundCall) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
    fn respond(&self, call: OutboundCall) -> BoxFuture<'static, Result<Response, BoxError>> {
        Box::pin((self)(call))
    }
}

/// Responder that always answers with a clone of the same response.
#[derive(Debug, Clone)]
pub struct FixedResponse(Response);

impl Responder for FixedResponse {
    fn respond(&self, _call: OutboundCall) -> BoxFuture<'static, Result<Response, BoxError>> {
        let response = self.0.clone();
        Box::pin(async move { Ok(response) })
    }
}

pub fn respond_with(response: Response) -> FixedResponse {
    FixedResponse(response)
}

#[derive(Clone)]
pub struct HandlerEntry {
    pub method: Method,
    pub matcher: UrlMatcher,
    pub responder: Arc<dyn Responder>,
}

impl HandlerEntry {
    pub fn matches(&self, call: &OutboundCall) -> bool {
        self.method == call.method() && self.matcher.matches(call.url())
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("method", &self.method)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    entries: Arc<RwLock<Vec<HandlerEntry>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler. Duplicates are allowed; the first one wins.
    pub fn register<M, R>(&self, method: Method, matcher: M, responder: R)
    where
        M: Into<UrlMatcher>,
        R: Responder + 'static,
    {
        self.entries.write().push(HandlerEntry {
            method,
            matcher: matcher.into(),
            responder: Arc::new(responder),
        });
    }

    pub fn get<M: Into<UrlMatcher>, R: Responder + 'static>(&self, matcher: M, responder: R) {
        self.register(Method::Get, matcher, responder)
    }

    pub fn post<M: Into<UrlMatcher>, R: Responder + 'static>(&self, matcher: M, responder: R) {
        self.register(Method::Post, matcher, responder)
    }

    pub fn put<M: Into<UrlMatcher>, R: Responder + 'static>(&self, matcher: M, responder: R) {
        self.register(Method::Put, matcher, responder)
    }

    pub fn delete<M: Into<UrlMatcher>, R: Responder + 'static>(&self, matcher: M, responder: R) {
        self.register(Method::Delete, matcher, responder)
    }

    pub fn patch<M: Into<UrlMatcher>, R: Responder + 'static>(&self, matcher: M, responder: R) {
        self.register(Method::Patch, matcher, responder)
    }

    pub fn head<M: Into<UrlMatcher>, R: Responder + 'static>(&self, matcher: M, responder: R) {
        self.register(Method::Head, matcher, responder)
    }

    pub fn options<M: Into<UrlMatcher>, R: Responder + 'static>(&self, matcher: M, responder: R) {
        self.register(Method::Options, matcher, responder)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// First entry, in registration order, whose method and URL both match.
    pub fn match_call(&self, call: &OutboundCall) -> Option<HandlerEntry> {
        self.entries.read().iter().find(|e| e.matches(call)).cloned()
    }

    /// Run the matching responder. `Ok(None)` means nothing matched; a
    /// responder error is returned as-is.
    pub async fn dispatch(&self, call: OutboundCall) -> Result<Option<Response>, BoxError> {
        let Some(entry) = self.match_call(&call) else {
            return Ok(None);
        };
        let response = entry.responder.respond(call).await?;
        Ok(Some(response))
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.read().iter()).finish()
    }
}
