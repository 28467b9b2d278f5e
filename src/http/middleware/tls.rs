//! TLS enforcement.
//!
//! A request is secure when the listener terminated TLS itself, or when a
//! trusted front proxy reports `X-Forwarded-Proto: https`. Insecure
//! requests are redirected only while the context requires TLS, so a
//! request that already arrived over HTTPS is never redirected again.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::context::RequestContext;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

pub async fn enforce_tls(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let required = req
        .extensions()
        .get::<RequestContext>()
        .is_some_and(|ctx| ctx.require_tls);

    if !required
        || is_secure(
            state.listener_tls(),
            state.config.tls.trust_forwarded_proto,
            req.headers(),
        )
    {
        return next.run(req).await;
    }

    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()));
    let Some(host) = host else {
        tracing::warn!(request_id = %request_id(req.headers()), "Cannot redirect to HTTPS without a Host header");
        return (StatusCode::BAD_REQUEST, "Missing Host header").into_response();
    };

    let path_and_query = req.uri().path_and_query().map_or("/", |pq| pq.as_str());
    let Ok(location) = HeaderValue::from_str(&format!("https://{host}{path_and_query}")) else {
        return (StatusCode::BAD_REQUEST, "Invalid Host header").into_response();
    };

    tracing::debug!(
        request_id = %request_id(req.headers()),
        location = ?location,
        "Redirecting to HTTPS"
    );
    metrics::record_tls_redirect();
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn is_secure(listener_tls: bool, trust_forwarded_proto: bool, headers: &HeaderMap) -> bool {
    if listener_tls {
        return true;
    }
    trust_forwarded_proto
        && headers
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::http::testing::{app, send};
    use crate::service::ServiceManager;
    use std::sync::Arc;

    fn forced() -> axum::Router {
        app(GatewayConfig::default(), Arc::new(ServiceManager::new(true)))
    }

    #[tokio::test]
    async fn plaintext_is_redirected_with_path_and_query() {
        let request = Request::get("/api/v1/login?next=%2Fapps")
            .header("host", "captain.example.com")
            .body(Body::empty())
            .unwrap();
        let response = send(&forced(), request).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()["location"],
            "https://captain.example.com/api/v1/login?next=%2Fapps"
        );
    }

    #[tokio::test]
    async fn forwarded_https_is_not_redirected_again() {
        let request = Request::get("/checkhealth")
            .header("host", "captain.example.com")
            .header("x-forwarded-proto", "https")
            .body(Body::empty())
            .unwrap();
        let response = send(&forced(), request).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn untrusted_forwarded_proto_is_ignored() {
        let mut config = GatewayConfig::default();
        config.tls.trust_forwarded_proto = false;
        let router = app(config, Arc::new(ServiceManager::new(true)));

        let request = Request::get("/checkhealth")
            .header("host", "captain.example.com")
            .header("x-forwarded-proto", "https")
            .body(Body::empty())
            .unwrap();
        let response = send(&router, request).await;

        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn missing_host_is_a_bad_request() {
        let request = Request::get("/checkhealth").body(Body::empty()).unwrap();
        let response = send(&forced(), request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn switch_is_read_per_request() {
        let manager = Arc::new(ServiceManager::new(true));
        let router = app(GatewayConfig::default(), manager.clone());
        let request = || {
            Request::get("/checkhealth")
                .header("host", "captain.example.com")
                .body(Body::empty())
                .unwrap()
        };

        assert_eq!(send(&router, request()).await.status(), StatusCode::FOUND);
        manager.set_force_ssl(false);
        assert_eq!(send(&router, request()).await.status(), StatusCode::OK);
    }

    #[test]
    fn listener_tls_is_always_secure() {
        assert!(is_secure(true, false, &HeaderMap::new()));
        assert!(!is_secure(false, true, &HeaderMap::new()));
    }
}
