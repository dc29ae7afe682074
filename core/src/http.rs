//! HTTP types shared by the caller, the interceptor and the registry.
//!
//! # Design
//! These types describe requests and responses as plain data. `Request` is
//! what code under test hands to the outbound-call primitive; `OutboundCall`
//! is the normalized, immutable descriptor the interceptor captures from it;
//! `Response` is what every path (mocked, bypassed, custom policy) returns.
//!
//! All fields use owned types so values move freely across the transport
//! boundary and into `'static` futures.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl FromStr for Method {
    type Err = CodecError;

    /// Case-insensitive; `"get"` and `"GET"` both parse to `Method::Get`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(CodecError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header collection with case-insensitive names.
///
/// Names are stored lower-cased. Appending a name that is already present
/// folds the new value into the existing one with `", "`, so a header that
/// was sent twice comes out as a single entry. That folding is lossy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header, folding into an existing entry with the same name.
    pub fn append(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => self.entries.push((name, value.to_string())),
        }
    }

    /// Replace any existing value for `name`.
    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.entries.push((name, value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.append(k.as_ref(), v.as_ref());
        }
        headers
    }
}

/// The argument handed to the outbound-call primitive.
///
/// Unlike `OutboundCall` this keeps the raw header list and a byte body, so
/// the `bypass` policy can re-issue exactly what the caller sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: &str) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the body and set `content-type: application/json`.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, CodecError> {
        let body = serde_json::to_vec(value)?;
        Ok(self.header("content-type", "application/json").body(body))
    }
}

/// A captured outbound call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCall {
    method: Method,
    url: String,
    headers: Headers,
    body: Option<String>,
}

impl OutboundCall {
    pub fn new(method: Method, url: &str, headers: Headers, body: Option<String>) -> Self {
        Self {
            method,
            url: url.to_string(),
            headers,
            body,
        }
    }

    /// Normalize a caller's request. Header duplicates are folded and a
    /// non-UTF-8 body is converted lossily.
    pub fn from_request(request: &Request) -> Self {
        Self {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.iter().cloned().collect(),
            body: request
                .body
                .as_deref()
                .map(|b| String::from_utf8_lossy(b).into_owned()),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Rebuild a `Request` carrying the same method, URL, headers and body.
    pub fn to_request(&self) -> Request {
        Request {
            method: self.method,
            url: self.url.clone(),
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: self.body.clone().map(String::into_bytes),
        }
    }
}

/// A live response returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: String,
}

impl Response {
    /// Empty-bodied response with the canonical reason phrase as status text.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            status_text: canonical_reason(status).to_string(),
            headers: Headers::new(),
            body: String::new(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        let mut response = Self::new(status);
        response
            .headers
            .set("content-type", "text/plain;charset=UTF-8");
        response.body = body.to_string();
        response
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Result<Self, CodecError> {
        let mut response = Self::new(status);
        response.headers.set("content-type", "application/json");
        response.body = serde_json::to_string(value)?;
        Ok(response)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_status_text(mut self, status_text: &str) -> Self {
        self.status_text = status_text.to_string();
        self
    }

    pub fn text_body(&self) -> &str {
        &self.body
    }

    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub(crate) fn canonical_reason(status: u16) -> &'static str {
    ::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}
