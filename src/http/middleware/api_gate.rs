//! API gate.
//!
//! Runs inside the `/api` nest, so it sees paths with the prefix stripped
//! (`/v1/user/apps`). Checks run in order and the first failure answers:
//!
//! ```text
//! version segment != supported     → GENERIC_ERROR "This captain instance only accepts API V1."
//! services not initialized         → CAPTAIN_NOT_INITIALIZED "Captain is not ready yet..."
//! no namespace, not a webhook call → GENERIC_ERROR "no namespace"
//! ```
//!
//! Rejections are API envelopes with HTTP 200 unless
//! `api.signal_http_status` is set.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::{ApiResponse, ApiStatusCode};
use crate::context::RequestContext;
use crate::error::DispatchError;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn api_gate(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let api = &state.config.api;
    let path = req.uri().path();
    let relative = relative(path);

    let Some(requested) = version_segment(relative) else {
        return next.run(req).await;
    };

    let ctx = req.extensions().get::<RequestContext>();
    let rejection = if requested != api.version {
        Some(DispatchError::ClientVersionMismatch {
            requested: requested.to_string(),
            supported: api.version.clone(),
        })
    } else if !ctx.is_some_and(|c| c.service_ready) {
        Some(DispatchError::ServiceNotReady)
    } else if ctx.and_then(|c| c.namespace.as_ref()).is_none() && !is_webhook(relative, &api.version) {
        Some(DispatchError::NamespaceMissing)
    } else {
        None
    };

    let Some(err) = rejection else {
        return next.run(req).await;
    };

    tracing::info!(
        request_id = %request_id(req.headers()),
        path = %path,
        reason = err.kind(),
        "API request rejected"
    );
    metrics::record_api_rejection(err.kind());

    let body = ApiResponse::new(
        err.api_status().unwrap_or(ApiStatusCode::GenericError),
        description(&err),
    );
    if api.signal_http_status {
        body.with_http_status(err.status())
    } else {
        body.into_response()
    }
}

/// Path below the mount with every leading `/` removed.
fn relative(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// First segment of a relative path, if any.
fn version_segment(relative: &str) -> Option<&str> {
    relative.split('/').next().filter(|segment| !segment.is_empty())
}

fn is_webhook(relative: &str, version: &str) -> bool {
    relative
        .strip_prefix(version)
        .is_some_and(|rest| rest.starts_with("/user/webhooks/"))
}

fn description(err: &DispatchError) -> String {
    match err {
        DispatchError::ClientVersionMismatch { supported, .. } => format!(
            "This captain instance only accepts API {}.",
            supported.to_uppercase()
        ),
        DispatchError::ServiceNotReady => "Captain is not ready yet...".to_string(),
        DispatchError::NamespaceMissing => "no namespace".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DomainRouters;
    use crate::config::GatewayConfig;
    use crate::http::testing::{app, app_with_routers, body_text, send};
    use crate::service::ServiceManager;
    use axum::{http::StatusCode, routing::any, routing::post, Router};
    use std::sync::Arc;

    async fn ready() -> Arc<ServiceManager> {
        let manager = Arc::new(ServiceManager::new(false));
        manager.initialize().await.unwrap();
        manager
    }

    fn routers() -> DomainRouters {
        DomainRouters::new(
            Router::new().route("/", any(|| async { "login" })),
            Router::new()
                .route("/apps", any(|| async { "apps" }))
                .route("/webhooks/triggerbuild", post(|| async { "build" })),
        )
    }

    async fn envelope(response: Response) -> serde_json::Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    #[tokio::test]
    async fn wrong_version_is_generic_error_with_200() {
        let router = app(GatewayConfig::default(), ready().await);

        for (method, path) in [
            ("GET", "/api/v2/login"),
            ("POST", "/api/v2/user/apps"),
            ("DELETE", "/api/v0/anything/else"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(path)
                .body(Body::empty())
                .unwrap();
            let response = send(&router, request).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                envelope(response).await,
                serde_json::json!({
                    "status": 1000,
                    "description": "This captain instance only accepts API V1."
                })
            );
        }
    }

    #[tokio::test]
    async fn version_check_precedes_readiness() {
        let router = app(
            GatewayConfig::default(),
            Arc::new(ServiceManager::new(false)),
        );

        let response = send(&router, Request::get("/api/v2/login").body(Body::empty()).unwrap()).await;
        assert_eq!(envelope(response).await["status"], 1000);
    }

    #[tokio::test]
    async fn not_ready_is_reported() {
        let router = app(
            GatewayConfig::default(),
            Arc::new(ServiceManager::new(false)),
        );

        let request = Request::get("/api/v1/login")
            .header("x-namespace", "captain")
            .body(Body::empty())
            .unwrap();
        let body = envelope(send(&router, request).await).await;
        assert_eq!(body["status"], 1001);
        assert_eq!(body["description"], "Captain is not ready yet...");
    }

    #[tokio::test]
    async fn namespace_is_required() {
        let router = app_with_routers(GatewayConfig::default(), ready().await, routers());

        let response = send(&router, Request::get("/api/v1/user/apps").body(Body::empty()).unwrap()).await;
        let body = envelope(response).await;
        assert_eq!(body["status"], 1000);
        assert_eq!(body["description"], "no namespace");

        let request = Request::get("/api/v1/user/apps")
            .header("x-namespace", "captain")
            .body(Body::empty())
            .unwrap();
        assert_eq!(body_text(send(&router, request).await).await, "apps");
    }

    #[tokio::test]
    async fn webhooks_skip_the_namespace_check() {
        let router = app_with_routers(GatewayConfig::default(), ready().await, routers());

        let request = Request::post("/api/v1/user/webhooks/triggerbuild")
            .body(Body::empty())
            .unwrap();
        let response = send(&router, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "build");
    }

    #[tokio::test]
    async fn unmatched_api_path_falls_through_to_404() {
        let router = app_with_routers(GatewayConfig::default(), ready().await, routers());

        let request = Request::get("/api/v1/user/nothing-here")
            .header("x-namespace", "captain")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&router, request).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn http_status_is_signalled_when_enabled() {
        let mut config = GatewayConfig::default();
        config.api.signal_http_status = true;
        let router = app(config, Arc::new(ServiceManager::new(false)));

        let response = send(&router, Request::get("/api/v2/login").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&router, Request::get("/api/v1/login").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(envelope(response).await["status"], 1001);
    }

    #[tokio::test]
    async fn mounts_accept_a_trailing_slash() {
        let routers = DomainRouters::new(
            Router::new().route("/", post(|| async { "logged in" })),
            Router::new().route("/apps", any(|| async { "apps" })),
        );
        let router = app_with_routers(GatewayConfig::default(), ready().await, routers);

        for path in ["/api/v1/login", "/api/v1/login/"] {
            let request = Request::post(path)
                .header("x-namespace", "captain")
                .body(Body::empty())
                .unwrap();
            let response = send(&router, request).await;
            assert_eq!(response.status(), StatusCode::OK, "{path}");
            assert_eq!(body_text(response).await, "logged in");
        }

        let request = Request::get("/api/v1/user/apps/")
            .header("x-namespace", "captain")
            .body(Body::empty())
            .unwrap();
        assert_eq!(body_text(send(&router, request).await).await, "apps");
    }

    #[tokio::test]
    async fn doubled_slash_keeps_the_webhook_exemption() {
        let router = app_with_routers(GatewayConfig::default(), ready().await, routers());

        let request = Request::post("/api//v1/user/webhooks/triggerbuild")
            .body(Body::empty())
            .unwrap();
        let response = send(&router, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "build");
    }

    #[test]
    fn extracts_version_segment() {
        assert_eq!(version_segment(relative("/v1/user/apps")), Some("v1"));
        assert_eq!(version_segment(relative("//v1/user/apps")), Some("v1"));
        assert_eq!(version_segment(relative("/v2")), Some("v2"));
        assert_eq!(version_segment(relative("/")), None);
    }

    #[test]
    fn webhook_match_ignores_leading_slashes() {
        assert!(is_webhook(relative("/v1/user/webhooks/triggerbuild"), "v1"));
        assert!(is_webhook(relative("///v1/user/webhooks/triggerbuild"), "v1"));
        assert!(!is_webhook(relative("/v1/user/apps"), "v1"));
        assert!(!is_webhook(relative("/v10/user/webhooks/x"), "v1"));
    }
}
