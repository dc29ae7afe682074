//! Error types for interception and the wire codec.
//!
//! # Design
//! `FetchError` is what a caller of the outbound-call primitive can observe.
//! Only two variants come from the unhandled-request policy: `Unhandled`
//! (the `raise` policy) and `Policy` (a custom policy function failed). A
//! responder failure never shows up here; the registry endpoint turns it
//! into a transport 500 and the interceptor hands that back as a response.

use thiserror::Error;

/// Boxed error returned by responders and custom policy functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `Fetch::fetch` and the global `fetch`.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No handler matched and the active policy is `raise`.
    #[error(
        "No handler found for request:\nURL: {url}\nMethod: {method}\n\
         If you want to allow unhandled requests, set the onUnhandledRequest option to 'bypass'."
    )]
    Unhandled { method: String, url: String },

    /// A custom unhandled-request policy returned an error.
    #[error("custom unhandled-request policy failed: {0}")]
    Policy(#[source] BoxError),

    /// The network call failed before a response was produced.
    #[error("transport error: {0}")]
    Transport(String),

    /// An envelope could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The request could not be turned into a valid HTTP request.
    #[error("invalid request: {0}")]
    Build(String),
}

/// Errors raised while converting between live values and envelopes.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("status {0} is outside 100-599")]
    InvalidStatus(u16),

    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),

    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),

    #[error("Missing required fields: url and method")]
    MissingRequiredFields,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unhandled_message_names_url_and_method() {
        let err = FetchError::Unhandled {
            method: "GET".to_string(),
            url: "https://external.api/".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("URL: https://external.api/"));
        assert!(msg.contains("Method: GET"));
    }

    #[test]
    fn codec_error_converts_into_fetch_error() {
        let err: FetchError = CodecError::InvalidStatus(42).into();
        assert_eq!(err.to_string(), "status 42 is outside 100-599");
    }
}
