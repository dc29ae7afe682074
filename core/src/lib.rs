//! Outbound-call interception for code under test.
//!
//! # Overview
//! Code under test sends its HTTP calls through [`fetch`]. Once
//! [`install`]ed, every call is encoded as a JSON envelope and shipped to a
//! registry endpoint (see the `mockwire-registry` crate), which answers with
//! a mocked response or a "no match" signal. Unmatched calls are resolved by
//! the configured [`UnhandledRequestPolicy`]. [`restore`] puts the real
//! primitive back.
//!
//! # Design
//! - The override is process-wide state owned by [`Interceptor::global`];
//!   independent [`Interceptor`] values can be built for tests.
//! - The wire format lives in [`codec`] and is shared with the registry.
//! - The registry endpoint is always contacted through the original
//!   primitive, never through the override.

pub mod codec;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod interceptor;
pub mod policy;

pub use codec::{CallEnvelope, ErrorPayload, ResponseEnvelope};
pub use config::InterceptorConfig;
pub use error::{BoxError, CodecError, FetchError};
pub use fetch::{Fetch, NetworkFetch};
pub use crate::http::{Headers, Method, OutboundCall, Request, Response};
pub use interceptor::{fetch, install, restore, Interceptor, NO_MATCH_STATUS};
pub use policy::{CustomPolicy, UnhandledRequestPolicy};
