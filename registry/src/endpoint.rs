//! The registry endpoint: one POST route that dispatches envelopes.
//!
//! # Design
//! Transport status and mocked status are kept apart. A matched call is
//! always answered at transport 200 with the mocked status inside the
//! envelope, so the transport status stays free to say:
//!
//! - 400: the envelope is malformed (missing `url`/`method`, bad JSON,
//!   unknown verb);
//! - 404: no handler matched (reserved; a handler may still legitimately
//!   return a mocked 404 inside a 200 envelope);
//! - 500: the responder failed or panicked. The failure detail is logged
//!   here and does not cross the boundary.

use std::panic::AssertUnwindSafe;

use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Json, Router};
use futures::FutureExt;
use mockwire_core::codec::{self, CallEnvelope, ErrorPayload, ResponseEnvelope};
use mockwire_core::config::DEFAULT_PATH;
use tracing::{debug, error};

use crate::registry::HandlerRegistry;

type Rejection = (StatusCode, Json<ErrorPayload>);

/// Router serving the endpoint at the default path.
pub fn app(registry: HandlerRegistry) -> Router {
    app_at(registry, DEFAULT_PATH)
}

pub fn app_at(registry: HandlerRegistry, path: &str) -> Router {
    Router::new()
        .route(path, post(internal_request))
        .with_state(registry)
}

fn reject(status: StatusCode, error: impl Into<String>) -> Rejection {
    (status, Json(ErrorPayload { error: error.into() }))
}

async fn internal_request(
    State(registry): State<HandlerRegistry>,
    body: Bytes,
) -> Result<Json<ResponseEnvelope>, Rejection> {
    let envelope: CallEnvelope = serde_json::from_slice(&body)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("Malformed request envelope: {e}")))?;
    let call = codec::decode_call(envelope)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string()))?;

    let method = call.method();
    let url = call.url().to_string();
    debug!(%method, %url, "dispatching call");

    match AssertUnwindSafe(registry.dispatch(call)).catch_unwind().await {
        Ok(Ok(Some(response))) => Ok(Json(codec::encode_response(&response))),
        Ok(Ok(None)) => Err(reject(
            StatusCode::NOT_FOUND,
            format!("No handler found for this request:\nurl: {url}\nmethod: {method}"),
        )),
        Ok(Err(e)) => {
            error!(%method, %url, error = %e, "error handling request");
            Err(reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"))
        }
        Err(_) => {
            error!(%method, %url, "responder panicked");
            Err(reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"))
        }
    }
}
