//! Context injection.
//!
//! # Responsibilities
//! - Read the tenant namespace header
//! - Ask the identity resolver for the caller
//! - Snapshot readiness and the force-SSL switch from the service manager
//!
//! # Design Decisions
//! - Resolvers are synchronous: they verify credentials already on the
//!   request, any slow lookup belongs behind a cache in the resolver
//! - Session-only resolution is a separate method so the monitoring gate
//!   can refuse API tokens

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName};

use crate::context::{Identity, Namespace, ProxyErrorGuard, RequestContext};
use crate::service::ServiceManager;

/// Resolves callers from request credentials.
pub trait IdentityResolver: Send + Sync + 'static {
    /// Identity from any credential the request carries (API token or session cookie).
    fn resolve(&self, headers: &HeaderMap, namespace: Option<&Namespace>) -> Option<Identity>;

    /// Identity from session cookie data only; API tokens are ignored.
    fn resolve_session(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// Resolver that never authenticates anyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl IdentityResolver for Anonymous {
    fn resolve(&self, _headers: &HeaderMap, _namespace: Option<&Namespace>) -> Option<Identity> {
        None
    }

    fn resolve_session(&self, _headers: &HeaderMap) -> Option<Identity> {
        None
    }
}

/// Builds the [`RequestContext`] for each request.
#[derive(Clone)]
pub struct ContextInjector {
    resolver: Arc<dyn IdentityResolver>,
    manager: Arc<ServiceManager>,
    namespace_header: HeaderName,
}

impl ContextInjector {
    pub fn new(
        resolver: Arc<dyn IdentityResolver>,
        manager: Arc<ServiceManager>,
        namespace_header: HeaderName,
    ) -> Self {
        Self {
            resolver,
            manager,
            namespace_header,
        }
    }

    pub fn inject(&self, headers: &HeaderMap) -> RequestContext {
        let namespace = headers
            .get(&self.namespace_header)
            .and_then(|v| v.to_str().ok())
            .and_then(Namespace::parse);
        let identity = self.resolver.resolve(headers, namespace.as_ref());

        RequestContext {
            identity,
            namespace,
            service_ready: self.manager.is_ready(),
            require_tls: self.manager.force_ssl(),
            proxy_error: ProxyErrorGuard::new(),
        }
    }

    /// Re-resolve identity from session data only.
    pub fn session_identity(&self, headers: &HeaderMap) -> Option<Identity> {
        self.resolver.resolve_session(headers)
    }
}
