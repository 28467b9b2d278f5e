//! Per-request context.
//!
//! # Data Flow
//! ```text
//! Incoming request (headers, cookies)
//!     → injector.rs (identity resolver + service manager)
//!     → RequestContext inserted into request extensions
//!     → read by the TLS stage, the monitoring gate and the API gate
//!     → dropped with the request
//! ```
//!
//! # Design Decisions
//! - Typed struct with explicit optional fields, no dynamic bag
//! - Identity resolution is an external collaborator behind a trait
//! - The proxy error guard is created here so each request owns its own flag

pub mod injector;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use injector::{Anonymous, ContextInjector, IdentityResolver};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
}

impl Identity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

/// Tenant namespace a request is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// Returns `None` for blank values.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Write-once flag marking that a proxy failure was already answered.
///
/// Clones share the flag, so the copy held by a proxy exchange and the one
/// in the request context observe the same state.
#[derive(Debug, Clone, Default)]
pub struct ProxyErrorGuard(Arc<AtomicBool>);

impl ProxyErrorGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the flag. Returns `true` only for the first caller.
    pub fn mark_handled(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_handled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Context established before the pipeline runs.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Present only for authenticated callers.
    pub identity: Option<Identity>,
    /// Absent until a tenant is resolved.
    pub namespace: Option<Namespace>,
    /// False until backing services finish initializing.
    pub service_ready: bool,
    /// Plaintext requests must be redirected to HTTPS.
    pub require_tls: bool,
    pub proxy_error: ProxyErrorGuard,
}
