//! Monitoring proxy gate.
//!
//! # Responsibilities
//! - Redirect the bare prefix to its canonical `<prefix>/` form
//! - Require a session identity (cookie data only, API tokens ignored)
//! - Hand the request to the forwarder and return whatever the exchange holds
//!
//! # Design Decisions
//! - The canonical redirect is relative and drops the query string
//! - A missing session is answered with a bare 500, never a login page
//! - Client disconnect drops this future, cancelling the upstream request

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::proxy::ProxyExchange;

pub async fn monitoring_gate(State(state): State<AppState>, mut req: Request<Body>) -> Response {
    let prefix = &state.config.monitoring.path_prefix;
    let canonical = format!("{prefix}/");

    if !req.uri().path().starts_with(&canonical) {
        tracing::debug!(path = %req.uri().path(), location = %canonical, "Canonicalizing monitoring path");
        return (StatusCode::FOUND, [(header::LOCATION, canonical)]).into_response();
    }

    let request_id = request_id(req.headers()).to_string();
    let identity = state.injector.session_identity(req.headers());

    let Some(ctx) = req.extensions_mut().get_mut::<RequestContext>() else {
        return DispatchError::InternalFailure("request context missing".to_string()).into_response();
    };
    ctx.identity = identity;
    let guard = ctx.proxy_error.clone();

    if ctx.identity.is_none() {
        let err = DispatchError::Unauthorized(prefix.clone());
        tracing::error!(request_id = %request_id, error = %err, "User not logged in for monitoring");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let exchange = ProxyExchange::new(request_id, guard);
    state.forwarder.forward(req, &exchange).await;

    match exchange.take_response() {
        Some(response) => response,
        None => DispatchError::InternalFailure("monitoring proxy produced no response".to_string())
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::config::GatewayConfig;
    use crate::http::testing::{app, app_with_upstream, body_text, fetch, send};
    use crate::service::ServiceManager;
    use axum::{body::Body, http::Request, http::StatusCode};
    use std::sync::Arc;

    #[tokio::test]
    async fn bare_prefix_redirects_to_canonical_form() {
        let router = app(GatewayConfig::default(), Arc::new(ServiceManager::new(false)));

        let response = fetch(&router, "/netdata").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()["location"], "/netdata/");
    }

    #[tokio::test]
    async fn redirect_ignores_session_and_query() {
        let router = app(GatewayConfig::default(), Arc::new(ServiceManager::new(false)));

        let request = Request::post("/netdata?x=1")
            .header("cookie", "captain-session=admin")
            .body(Body::empty())
            .unwrap();
        let response = send(&router, request).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()["location"], "/netdata/");
    }

    #[tokio::test]
    async fn missing_session_is_a_bare_500() {
        let router = app(GatewayConfig::default(), Arc::new(ServiceManager::new(false)));

        let response = fetch(&router, "/netdata/charts").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn api_token_does_not_open_monitoring() {
        let router = app(GatewayConfig::default(), Arc::new(ServiceManager::new(false)));

        let request = Request::get("/netdata/charts")
            .header("x-captain-auth", "token-user")
            .body(Body::empty())
            .unwrap();
        let response = send(&router, request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unreachable_upstream_yields_plain_text_500() {
        let router = app_with_upstream("127.0.0.1", 1);

        let request = Request::get("/netdata/charts")
            .header("cookie", "captain-session=admin")
            .body(Body::empty())
            .unwrap();
        let response = send(&router, request).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert!(body_text(response)
            .await
            .starts_with("Something went wrong... err: \n "));
    }
}
