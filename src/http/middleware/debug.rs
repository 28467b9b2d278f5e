//! Debug-mode helpers: permissive CORS and `/force-exit`.
//!
//! Installed only when `debug = true`. `/force-exit` answers immediately
//! and triggers graceful shutdown half a second later.

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::request_id;
use crate::http::server::AppState;

const FORCE_EXIT_PATH: &str = "/force-exit";
const FORCE_EXIT_DELAY: Duration = Duration::from_millis(500);

pub async fn debug_gate(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path();
    let mut response = if path == FORCE_EXIT_PATH || path.starts_with("/force-exit/") {
        tracing::warn!(request_id = %request_id(req.headers()), "Exit requested over HTTP");
        state.shutdown.trigger_after(FORCE_EXIT_DELAY);
        "Okay... I will exit in a second...".into_response()
    } else {
        next.run(req).await
    };

    let allowed_headers = format!("{},x-captain-auth,Content-Type", state.config.api.namespace_header);
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    if let Ok(value) = HeaderValue::from_str(&allowed_headers) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
    }
    response
}
