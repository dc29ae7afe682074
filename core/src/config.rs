//! Interceptor configuration.
//!
//! Defaults match the registry server's, so `install(Default::default())`
//! talks to a `RegistryServer` started with its own defaults.

use std::env;

use crate::policy::UnhandledRequestPolicy;

/// Default registry endpoint port.
pub const DEFAULT_PORT: u16 = 9966;

/// Default registry endpoint route.
pub const DEFAULT_PATH: &str = "/internal-request";

pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Environment variable overriding the endpoint port.
pub const PORT_ENV: &str = "MOCKWIRE_PORT";

/// Environment variable naming the unhandled-request policy.
pub const POLICY_ENV: &str = "MOCKWIRE_ON_UNHANDLED_REQUEST";

#[derive(Debug, Clone)]
pub struct InterceptorConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub on_unhandled_request: UnhandledRequestPolicy,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
            on_unhandled_request: UnhandledRequestPolicy::Warn,
        }
    }
}

impl InterceptorConfig {
    /// Defaults overridden by `MOCKWIRE_PORT` and
    /// `MOCKWIRE_ON_UNHANDLED_REQUEST`. Unparseable values are ignored with a
    /// warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(port) = port_from_env() {
            config.port = port;
        }
        if let Ok(raw) = env::var(POLICY_ENV) {
            match raw.parse() {
                Ok(policy) => config.on_unhandled_request = policy,
                Err(e) => tracing::warn!(error = %e, "ignoring {POLICY_ENV}"),
            }
        }
        config
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub fn with_policy(mut self, policy: UnhandledRequestPolicy) -> Self {
        self.on_unhandled_request = policy;
        self
    }

    /// Absolute URL of the registry endpoint.
    pub fn endpoint_url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!("http://{}:{}{path}", self.host, self.port)
    }
}

/// Read `MOCKWIRE_PORT`, if set to a valid port number.
pub fn port_from_env() -> Option<u16> {
    let raw = env::var(PORT_ENV).ok()?;
    match raw.parse() {
        Ok(port) => Some(port),
        Err(_) => {
            tracing::warn!(value = %raw, "ignoring invalid {PORT_ENV}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_registry() {
        let config = InterceptorConfig::default();
        assert_eq!(config.port, 9966);
        assert!(matches!(config.on_unhandled_request, UnhandledRequestPolicy::Warn));
        assert_eq!(config.endpoint_url(), "http://127.0.0.1:9966/internal-request");
    }

    // The only test in this binary touching the process environment.
    #[test]
    fn env_overrides_apply_and_bad_values_are_ignored() {
        env::remove_var(PORT_ENV);
        env::remove_var(POLICY_ENV);
        assert_eq!(port_from_env(), None);
        let config = InterceptorConfig::from_env();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(matches!(config.on_unhandled_request, UnhandledRequestPolicy::Warn));

        env::set_var(PORT_ENV, "4321");
        env::set_var(POLICY_ENV, "error");
        assert_eq!(port_from_env(), Some(4321));
        let config = InterceptorConfig::from_env();
        assert_eq!(config.port, 4321);
        assert!(matches!(config.on_unhandled_request, UnhandledRequestPolicy::Raise));

        env::set_var(POLICY_ENV, "bypass");
        let config = InterceptorConfig::from_env();
        assert!(matches!(config.on_unhandled_request, UnhandledRequestPolicy::Bypass));

        env::set_var(PORT_ENV, "not-a-port");
        env::set_var(POLICY_ENV, "ignore");
        assert_eq!(port_from_env(), None);
        let config = InterceptorConfig::from_env();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(matches!(config.on_unhandled_request, UnhandledRequestPolicy::Warn));

        env::set_var(PORT_ENV, "70000");
        assert_eq!(port_from_env(), None);

        env::remove_var(PORT_ENV);
        env::remove_var(POLICY_ENV);
    }

    #[test]
    fn endpoint_url_adds_missing_leading_slash() {
        let config = InterceptorConfig::default()
            .with_host("localhost")
            .with_port(4000)
            .with_path("mock");
        assert_eq!(config.endpoint_url(), "http://localhost:4000/mock");
    }
}
