//! The process-wide override behind `mockwire_core::fetch`.
//!
//! Kept to a single test so nothing else in this binary touches the global
//! interceptor concurrently.

use axum::{routing::get, Router};
use mockwire_core::{Interceptor, Request, Response, UnhandledRequestPolicy};
use mockwire_registry::{respond_with, RegistryServer, ServerConfig};

#[tokio::test]
async fn global_install_and_restore_lifecycle() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream = listener.local_addr().unwrap();
    let app = Router::new().route("/", get(|| async { "real upstream" }));
    tokio::spawn(async move { axum::serve(listener, app).await });
    let real_url = format!("http://{upstream}/");

    let mut server = RegistryServer::start(ServerConfig::default().with_port(0))
        .await
        .unwrap();
    server
        .registry()
        .get("https://external.api/", respond_with(Response::text(200, "mocked")));

    // Before install the primitive is the real network.
    let before = mockwire_core::fetch(Request::get(&real_url)).await.unwrap();
    assert_eq!(before.body, "real upstream");

    mockwire_core::install(
        server
            .interceptor_config()
            .with_policy(UnhandledRequestPolicy::Raise),
    );
    assert!(Interceptor::global().is_active());

    // Re-install while active is ignored: the raise policy stays in force.
    mockwire_core::install(
        server
            .interceptor_config()
            .with_policy(UnhandledRequestPolicy::Bypass),
    );
    assert!(matches!(
        Interceptor::global().policy(),
        Some(UnhandledRequestPolicy::Raise)
    ));

    let mocked = mockwire_core::fetch(Request::get("https://external.api/"))
        .await
        .unwrap();
    assert_eq!(mocked.body, "mocked");
    assert!(mockwire_core::fetch(Request::get(&real_url)).await.is_err());

    mockwire_core::restore();
    mockwire_core::restore();
    assert!(!Interceptor::global().is_active());

    let after = mockwire_core::fetch(Request::get(&real_url)).await.unwrap();
    assert_eq!(after.body, "real upstream");

    server.close().await.unwrap();
}
