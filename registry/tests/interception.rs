//! End-to-end interception against a live registry endpoint.
//!
//! # Design
//! Each test starts its own `RegistryServer` on a random port and, where a
//! "real network" is needed, a small local upstream server. Calls go through
//! a non-global `Interceptor` built on `NetworkFetch`, so tests never share
//! the process-wide override.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use mockwire_core::{
    BoxError, FetchError, Interceptor, NetworkFetch, OutboundCall, Request, Response,
    UnhandledRequestPolicy,
};
use mockwire_registry::{respond_with, RegistryServer, ServerConfig, UrlMatcher};

async fn start_registry() -> RegistryServer {
    RegistryServer::start(ServerConfig::default().with_port(0))
        .await
        .unwrap()
}

/// Stand-in for the real network: answers every GET on `/` with 200.
async fn start_upstream() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/", get(|| async { "real upstream" }));
    tokio::spawn(async move { axum::serve(listener, app).await });
    addr
}

fn interceptor() -> Interceptor {
    Interceptor::new(Arc::new(NetworkFetch::new()))
}

#[tokio::test]
async fn matched_call_returns_mocked_json() {
    let mut server = start_registry().await;
    server.registry().get("https://external.api/", |_call: OutboundCall| async move {
        let body = serde_json::json!({"message": "Mocked response from external API"});
        Response::json(200, &body).map_err(BoxError::from)
    });
    let interceptor = interceptor();
    interceptor.install(server.interceptor_config());

    let response = interceptor
        .fetch(Request::get("https://external.api/"))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    let json: serde_json::Value = response.json_body().unwrap();
    assert_eq!(
        json,
        serde_json::json!({"message": "Mocked response from external API"})
    );

    interceptor.restore();
    server.close().await.unwrap();
}

#[tokio::test]
async fn unmatched_call_under_raise_fails() {
    let mut server = start_registry().await;
    let interceptor = interceptor();
    interceptor.install(
        server
            .interceptor_config()
            .with_policy(UnhandledRequestPolicy::Raise),
    );

    let err = interceptor
        .fetch(Request::get("https://external.api/"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Unhandled { .. }));
    let msg = err.to_string();
    assert!(msg.contains("https://external.api/"));
    assert!(msg.contains("GET"));

    interceptor.restore();
    server.close().await.unwrap();
}

#[tokio::test]
async fn unmatched_call_under_bypass_reaches_the_network() {
    let mut server = start_registry().await;
    let upstream = start_upstream().await;
    let interceptor = interceptor();
    interceptor.install(
        server
            .interceptor_config()
            .with_policy(UnhandledRequestPolicy::Bypass),
    );

    let response = interceptor
        .fetch(Request::get(&format!("http://{upstream}/")))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.status_text, "OK");
    assert_eq!(response.body, "real upstream");

    interceptor.restore();
    server.close().await.unwrap();
}

#[tokio::test]
async fn unmatched_call_under_custom_policy() {
    let mut server = start_registry().await;
    let interceptor = interceptor();
    let policy = UnhandledRequestPolicy::custom(|call: OutboundCall| async move {
        if call.url() == "https://another.external.api/" {
            Ok(Response::text(200, "X"))
        } else {
            Ok(Response::text(400, "Y"))
        }
    });
    interceptor.install(server.interceptor_config().with_policy(policy));

    let hit = interceptor
        .fetch(Request::get("https://another.external.api/"))
        .await
        .unwrap();
    assert_eq!(hit.status, 200);
    assert_eq!(hit.body, "X");

    let miss = interceptor
        .fetch(Request::get("https://external.api/"))
        .await
        .unwrap();
    assert_eq!(miss.status, 400);
    assert_eq!(miss.body, "Y");

    interceptor.restore();
    server.close().await.unwrap();
}

#[tokio::test]
async fn unmatched_call_under_warn_is_an_empty_success() {
    let mut server = start_registry().await;
    let interceptor = interceptor();
    interceptor.install(server.interceptor_config());

    let response = interceptor
        .fetch(Request::get("https://external.api/"))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "");

    interceptor.restore();
    server.close().await.unwrap();
}

#[tokio::test]
async fn responses_survive_the_round_trip() {
    let mut server = start_registry().await;
    let cases = vec![
        Response::text(200, "plain"),
        Response::text(404, "mocked not found").with_header("X-Trace", "abc"),
        Response::json(201, &serde_json::json!({"id": 7, "tags": ["a", "b"]}))
            .unwrap()
            .with_header("Location", "/items/7"),
        Response::new(204).with_header("X-Empty", "yes"),
        Response::text(503, "unicode ✓ body").with_status_text("Try Later"),
    ];
    for (i, response) in cases.iter().enumerate() {
        server.registry().get(
            format!("https://external.api/case/{i}"),
            respond_with(response.clone()),
        );
    }

    let interceptor = interceptor();
    interceptor.install(
        server
            .interceptor_config()
            .with_policy(UnhandledRequestPolicy::Raise),
    );
    for (i, expected) in cases.iter().enumerate() {
        let got = interceptor
            .fetch(Request::get(&format!("https://external.api/case/{i}")))
            .await
            .unwrap();
        assert_eq!(&got, expected, "case {i}");
    }

    interceptor.restore();
    server.close().await.unwrap();
}

#[tokio::test]
async fn request_details_reach_the_responder() {
    let mut server = start_registry().await;
    server.registry().register(
        mockwire_core::Method::Put,
        UrlMatcher::pattern(r"https://external\.api/items/\d+").unwrap(),
        |call: OutboundCall| async move {
            let accept = call.headers().get("accept").unwrap_or_default().to_string();
            let body = call.body().unwrap_or_default().to_string();
            Ok(Response::text(200, &format!("{} {accept} {body}", call.method())))
        },
    );

    let interceptor = interceptor();
    interceptor.install(server.interceptor_config());
    let request = Request::new(mockwire_core::Method::Put, "https://external.api/items/3")
        .header("Accept", "text/plain")
        .header("accept", "text/html")
        .body("payload");
    let response = interceptor.fetch(request).await.unwrap();
    assert_eq!(response.body, "PUT text/plain, text/html payload");

    interceptor.restore();
    server.close().await.unwrap();
}

#[tokio::test]
async fn responder_failure_surfaces_as_500() {
    let mut server = start_registry().await;
    server.registry().get("https://external.api/", |_call: OutboundCall| async move {
        Err::<Response, BoxError>("upstream fixture missing".into())
    });
    let interceptor = interceptor();
    interceptor.install(
        server
            .interceptor_config()
            .with_policy(UnhandledRequestPolicy::Raise),
    );

    let response = interceptor
        .fetch(Request::get("https://external.api/"))
        .await
        .unwrap();
    assert_eq!(response.status, 500);
    assert_eq!(response.body, "Internal server error");

    interceptor.restore();
    server.close().await.unwrap();
}

#[tokio::test]
async fn restore_returns_to_the_real_network() {
    let mut server = start_registry().await;
    let upstream = start_upstream().await;
    let url = format!("http://{upstream}/");
    server
        .registry()
        .get(url.as_str(), respond_with(Response::text(200, "mocked")));

    let interceptor = interceptor();
    interceptor.install(server.interceptor_config());
    let mocked = interceptor.fetch(Request::get(&url)).await.unwrap();
    assert_eq!(mocked.body, "mocked");

    interceptor.restore();
    let real = interceptor.fetch(Request::get(&url)).await.unwrap();
    assert_eq!(real.body, "real upstream");

    server.close().await.unwrap();
}

#[tokio::test]
async fn reset_handlers_between_tests() {
    let mut server = start_registry().await;
    server
        .registry()
        .get("https://external.api/", respond_with(Response::text(200, "once")));
    let interceptor = interceptor();
    interceptor.install(
        server
            .interceptor_config()
            .with_policy(UnhandledRequestPolicy::Raise),
    );

    let first = interceptor
        .fetch(Request::get("https://external.api/"))
        .await
        .unwrap();
    assert_eq!(first.body, "once");

    server.reset_handlers();
    let err = interceptor
        .fetch(Request::get("https://external.api/"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Unhandled { .. }));

    interceptor.restore();
    server.close().await.unwrap();
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let mut server = start_registry().await;
    let config = server.interceptor_config();
    server.close().await.unwrap();

    let interceptor = interceptor();
    interceptor.install(config.with_policy(UnhandledRequestPolicy::Raise));
    let err = interceptor
        .fetch(Request::get("https://external.api/"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
    interceptor.restore();
}
