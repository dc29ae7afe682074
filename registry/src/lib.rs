//! Handler registry and registry endpoint for mockwire.
//!
//! # Overview
//! Tests register handlers on a [`HandlerRegistry`]; a [`RegistryServer`]
//! exposes it over HTTP at a single POST route. An interceptor installed
//! with `mockwire_core::install` forwards every outbound call there and
//! gets back either a mocked response or a reserved "no match" signal.
//!
//! # Design
//! - Handlers are matched first-match-wins in registration order.
//! - The mocked status travels inside the JSON envelope; the transport
//!   status only reports transport conditions (400, 404, 500).
//! - The wire types come from `mockwire_core::codec`, so both sides of the
//!   boundary agree on one format.

pub mod endpoint;
pub mod matcher;
pub mod registry;
pub mod server;

pub use endpoint::{app, app_at};
pub use matcher::UrlMatcher;
pub use registry::{respond_with, FixedResponse, HandlerEntry, HandlerRegistry, Responder};
pub use server::{run, RegistryServer, ServerConfig};
