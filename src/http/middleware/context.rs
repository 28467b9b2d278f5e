//! Context injection middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Attach a fresh [`RequestContext`](crate::context::RequestContext) to the request.
pub async fn inject_context(State(state): State<AppState>, mut req: Request<Body>, next: Next) -> Response {
    metrics::record_request();

    let ctx = state.injector.inject(req.headers());
    tracing::trace!(
        request_id = %request_id(req.headers()),
        namespace = ?ctx.namespace,
        authenticated = ctx.identity.is_some(),
        ready = ctx.service_ready,
        "Context injected"
    );
    req.extensions_mut().insert(ctx);

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use crate::api::DomainRouters;
    use crate::config::GatewayConfig;
    use crate::context::RequestContext;
    use crate::http::testing::{app_with_routers, body_text, send};
    use crate::service::ServiceManager;
    use axum::{body::Body, http::Request, routing::get, Extension, Router};
    use std::sync::Arc;

    #[tokio::test]
    async fn handlers_see_the_injected_context() {
        let user = Router::new().route(
            "/whoami",
            get(|Extension(ctx): Extension<RequestContext>| async move {
                format!(
                    "{}@{}",
                    ctx.identity.map(|i| i.subject).unwrap_or_default(),
                    ctx.namespace.map(|n| n.to_string()).unwrap_or_default()
                )
            }),
        );
        let manager = Arc::new(ServiceManager::new(false));
        manager.initialize().await.unwrap();
        let router = app_with_routers(
            GatewayConfig::default(),
            manager,
            DomainRouters::new(Router::new(), user),
        );

        let request = Request::get("/api/v1/user/whoami")
            .header("x-namespace", "captain")
            .header("x-captain-auth", "alice")
            .body(Body::empty())
            .unwrap();
        let response = send(&router, request).await;

        assert_eq!(body_text(response).await, "alice@captain");
    }
}
