//! What to do with a call no registered handler answered.
//!
//! # Design
//! The policy is a closed set of variants fixed at `install` time. The
//! evaluator is a pure decision function; carrying out the decision (logging,
//! calling the original primitive, awaiting a custom responder) is the
//! interceptor's job.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::{BoxError, FetchError};
use crate::http::{OutboundCall, Response};

/// A user-supplied answer for unhandled calls.
pub trait CustomPolicy: Send + Sync {
    fn respond(&self, call: OutboundCall) -> BoxFuture<'static, Result<Response, BoxError>>;
}

impl<F, Fut> CustomPolicy for F
where
    F: Fn(OutboundCall) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
    fn respond(&self, call: OutboundCall) -> BoxFuture<'static, Result<Response, BoxError>> {
        Box::pin((self)(call))
    }
}

/// Policy applied when the registry endpoint reports "no match".
#[derive(Clone, Default)]
pub enum UnhandledRequestPolicy {
    /// Log a warning, then fall through to an empty 200 response.
    #[default]
    Warn,
    /// Fail the call with `FetchError::Unhandled`.
    Raise,
    /// Re-issue the call through the original primitive.
    Bypass,
    Custom(Arc<dyn CustomPolicy>),
}

impl UnhandledRequestPolicy {
    pub fn custom<P: CustomPolicy + 'static>(policy: P) -> Self {
        UnhandledRequestPolicy::Custom(Arc::new(policy))
    }

    pub fn name(&self) -> &'static str {
        match self {
            UnhandledRequestPolicy::Warn => "warn",
            UnhandledRequestPolicy::Raise => "raise",
            UnhandledRequestPolicy::Bypass => "bypass",
            UnhandledRequestPolicy::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for UnhandledRequestPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognized policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown unhandled-request policy {0:?}, expected warn, raise, error or bypass")]
pub struct UnknownPolicy(pub String);

impl FromStr for UnhandledRequestPolicy {
    type Err = UnknownPolicy;

    /// `"error"` is accepted as an alias for `"raise"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(UnhandledRequestPolicy::Warn),
            "raise" | "error" => Ok(UnhandledRequestPolicy::Raise),
            "bypass" => Ok(UnhandledRequestPolicy::Bypass),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

/// Outcome of evaluating the policy against one unmatched call.
pub enum Decision {
    /// Log, then treat the no-match payload as a response envelope.
    FallThrough,
    Raise(FetchError),
    DelegateToOriginal,
    Respond(Arc<dyn CustomPolicy>),
}

impl fmt::Debug for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::FallThrough => f.write_str("FallThrough"),
            Decision::Raise(err) => f.debug_tuple("Raise").field(err).finish(),
            Decision::DelegateToOriginal => f.write_str("DelegateToOriginal"),
            Decision::Respond(_) => f.write_str("Respond(..)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PolicyEvaluator {
    policy: UnhandledRequestPolicy,
}

impl PolicyEvaluator {
    pub fn new(policy: UnhandledRequestPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &UnhandledRequestPolicy {
        &self.policy
    }

    pub fn resolve(&self, call: &OutboundCall) -> Decision {
        match &self.policy {
            UnhandledRequestPolicy::Warn => Decision::FallThrough,
            UnhandledRequestPolicy::Raise => Decision::Raise(FetchError::Unhandled {
                method: call.method().to_string(),
                url: call.url().to_string(),
            }),
            UnhandledRequestPolicy::Bypass => Decision::DelegateToOriginal,
            UnhandledRequestPolicy::Custom(policy) => Decision::Respond(Arc::clone(policy)),
        }
    }
}
