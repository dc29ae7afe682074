//! Wire codec between live calls/responses and JSON envelopes.
//!
//! # Design
//! The interceptor and the registry endpoint only ever exchange two JSON
//! shapes: a `CallEnvelope` going in and a `ResponseEnvelope` coming back.
//! Both are transport-neutral; the mocked status lives inside the response
//! envelope, never at the transport layer.
//!
//! Lossy points:
//! - duplicate request headers are folded into one entry (see `Headers`);
//! - a non-UTF-8 request body is converted lossily to text.
//!
//! Every `ResponseEnvelope` field is optional on decode. A payload without a
//! `status` decodes as a 200 with an empty body, which is exactly what the
//! `warn` policy observes when it falls through with the no-match payload.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CodecError;
use crate::http::{Headers, Method, OutboundCall, Response};

/// Status used when a decoded envelope carries none.
pub const DEFAULT_STATUS: u16 = 200;

/// Encoded `OutboundCall`, as POSTed to the registry endpoint.
///
/// `url` and `method` are optional here so the endpoint can tell a
/// malformed envelope apart from one that simply does not match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Encoded `Response`, returned by the endpoint at transport status 200.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Diagnostic payload for 400, 404 and 500 transport answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

pub fn encode_call(call: &OutboundCall) -> CallEnvelope {
    CallEnvelope {
        url: Some(call.url().to_string()),
        method: Some(call.method().as_str().to_string()),
        headers: call.headers().clone(),
        body: call.body().map(str::to_string),
    }
}

/// Rebuild an `OutboundCall`. Fails when `url` or `method` is missing or
/// the method is not a known verb.
pub fn decode_call(envelope: CallEnvelope) -> Result<OutboundCall, CodecError> {
    let (url, method) = match (envelope.url, envelope.method) {
        (Some(url), Some(method)) if !url.is_empty() && !method.is_empty() => (url, method),
        _ => return Err(CodecError::MissingRequiredFields),
    };
    let method: Method = method.parse()?;
    // An empty body is treated as absent.
    let body = envelope.body.filter(|b| !b.is_empty());
    Ok(OutboundCall::new(method, &url, envelope.headers, body))
}

pub fn encode_response(response: &Response) -> ResponseEnvelope {
    ResponseEnvelope {
        status: Some(response.status),
        status_text: Some(response.status_text.clone()),
        headers: response.headers.clone(),
        body: Some(response.body.clone()),
    }
}

/// Reconstruct a live `Response`.
///
/// Header names are checked only here, so a malformed name coming off the
/// transport surfaces as `CodecError::InvalidHeaderName` at reconstruction.
pub fn decode_response(envelope: ResponseEnvelope) -> Result<Response, CodecError> {
    let status = envelope.status.unwrap_or(DEFAULT_STATUS);
    if !(100..=599).contains(&status) {
        return Err(CodecError::InvalidStatus(status));
    }
    for (name, _) in envelope.headers.iter() {
        ::http::HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| CodecError::InvalidHeaderName(name.to_string()))?;
    }
    Ok(Response {
        status,
        status_text: envelope.status_text.unwrap_or_default(),
        headers: envelope.headers,
        body: envelope.body.unwrap_or_default(),
    })
}

/// Parse raw endpoint bytes as a `ResponseEnvelope` and reconstruct.
pub fn decode_response_bytes(bytes: &[u8]) -> Result<Response, CodecError> {
    let envelope: ResponseEnvelope = serde_json::from_slice(bytes)?;
    decode_response(envelope)
}

impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HeadersVisitor;

        impl<'de> Visitor<'de> for HeadersVisitor {
            type Value = Headers;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of header names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Headers, A::Error> {
                let mut headers = Headers::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    headers.append(&k, &v);
                }
                Ok(headers)
            }
        }

        deserializer.deserialize_map(HeadersVisitor)
    }
}
