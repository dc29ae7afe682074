//! Lifecycle of a running registry endpoint.

use std::io;
use std::net::SocketAddr;

use mockwire_core::config::{port_from_env, DEFAULT_PATH, DEFAULT_PORT};
use mockwire_core::InterceptorConfig;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use crate::endpoint::app_at;
use crate::registry::HandlerRegistry;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind on 127.0.0.1; 0 picks a free one.
    pub port: u16,
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults, with the port overridden by `MOCKWIRE_PORT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(port) = port_from_env() {
            config.port = port;
        }
        config
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }
}

/// Serve the endpoint on a caller-provided listener until it fails.
pub async fn run(listener: TcpListener, registry: HandlerRegistry, path: &str) -> io::Result<()> {
    axum::serve(listener, app_at(registry, path)).await
}

/// A registry endpoint running in a background task.
///
/// Dropping the handle signals shutdown without waiting; call `close` to
/// wait for the server task to finish.
pub struct RegistryServer {
    registry: HandlerRegistry,
    addr: SocketAddr,
    path: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<io::Result<()>>>,
}

impl RegistryServer {
    /// Bind and start serving an empty registry.
    pub async fn start(config: ServerConfig) -> io::Result<Self> {
        Self::start_with(config, HandlerRegistry::new()).await
    }

    pub async fn start_with(config: ServerConfig, registry: HandlerRegistry) -> io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", config.port)).await?;
        let addr = listener.local_addr()?;
        let app = app_at(registry.clone(), &config.path);
        let (tx, rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await
        });
        info!(%addr, path = %config.path, "registry endpoint listening");

        Ok(Self {
            registry,
            addr,
            path: config.path,
            shutdown: Some(tx),
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn endpoint_url(&self) -> String {
        format!("http://{}{}", self.addr, self.path)
    }

    /// Interceptor configuration pointing at this server, default policy.
    pub fn interceptor_config(&self) -> InterceptorConfig {
        InterceptorConfig::default()
            .with_host(&self.addr.ip().to_string())
            .with_port(self.port())
            .with_path(&self.path)
    }

    /// The registry this server dispatches into.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn reset_handlers(&self) {
        self.registry.clear();
    }

    /// Shut down gracefully and wait for the server task. Idempotent.
    pub async fn close(&mut self) -> io::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await.map_err(io::Error::other)??;
            info!(addr = %self.addr, "registry endpoint closed");
        }
        Ok(())
    }
}

impl Drop for RegistryServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
