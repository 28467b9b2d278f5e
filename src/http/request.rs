//! Request identification.
//!
//! # Responsibilities
//! - Assign a UUID `x-request-id` to every incoming request
//! - Echo the id back on the response
//! - Give handlers a borrowed view of the id for log correlation
//!
//! # Design Decisions
//! - A caller-supplied `x-request-id` is kept, not replaced
//! - Missing or non-UTF-8 ids read as `"unknown"` instead of failing

use axum::http::{HeaderMap, HeaderName};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const X_REQUEST_ID: &str = "x-request-id";

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// Layer that stamps a fresh id onto requests lacking one.
pub fn set_request_id() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(request_id_header(), MakeRequestUuid)
}

/// Layer that copies the request id onto the response.
pub fn propagate_request_id() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(request_id_header())
}

/// The id assigned to this request.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
