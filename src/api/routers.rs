//! Mount points for the domain routers.

use axum::Router;

/// The two externally supplied API routers.
///
/// `login` is reachable without identity. `user` is tenant scoped; its
/// `webhooks/` subtree is exempt from the namespace requirement.
#[derive(Clone)]
pub struct DomainRouters {
    pub login: Router,
    pub user: Router,
}

impl DomainRouters {
    pub fn new(login: Router, user: Router) -> Self {
        Self { login, user }
    }

    /// Nest both routers under `/<version>/login` and `/<version>/user`.
    pub fn mount(self, version: &str) -> Router {
        Router::new()
            .nest(&format!("/{version}/login"), self.login)
            .nest(&format!("/{version}/user"), self.user)
    }
}

impl Default for DomainRouters {
    fn default() -> Self {
        Self::new(Router::new(), Router::new())
    }
}
