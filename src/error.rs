//! Dispatch failure taxonomy.
//!
//! # Propagation
//! ```text
//! ClientVersionMismatch / ServiceNotReady / NamespaceMissing → API gate envelope
//! UpstreamProxyFailure                                       → proxy error guard (plain text)
//! Unauthorized                                               → monitoring gate (bare 500)
//! NotFound / InternalFailure                                 → terminal error stage
//! ```
//!
//! Only the last row ever becomes a `Response` through `IntoResponse`: the
//! response carries a [`FailureReport`] extension that the error stage
//! replaces with a rendered page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ApiStatusCode;

/// Every way a request can fail inside the pipeline.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unsupported API version {requested:?}, expected {supported:?}")]
    ClientVersionMismatch { requested: String, supported: String },

    #[error("backing services are not initialized")]
    ServiceNotReady,

    #[error("request carries no tenant namespace")]
    NamespaceMissing,

    #[error("upstream proxy failure: {0}")]
    UpstreamProxyFailure(String),

    #[error("no session identity for {0}")]
    Unauthorized(String),

    #[error("Not Found")]
    NotFound { path: String },

    #[error("{0}")]
    InternalFailure(String),
}

impl DispatchError {
    /// HTTP status that describes this failure on the transport.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::ClientVersionMismatch { .. } | DispatchError::NamespaceMissing => {
                StatusCode::BAD_REQUEST
            }
            DispatchError::ServiceNotReady => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::UpstreamProxyFailure(_)
            | DispatchError::Unauthorized(_)
            | DispatchError::InternalFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Platform status code for failures answered with an API envelope.
    pub fn api_status(&self) -> Option<ApiStatusCode> {
        match self {
            DispatchError::ClientVersionMismatch { .. } | DispatchError::NamespaceMissing => {
                Some(ApiStatusCode::GenericError)
            }
            DispatchError::ServiceNotReady => Some(ApiStatusCode::CaptainNotInitialized),
            _ => None,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::ClientVersionMismatch { .. } => "client_version_mismatch",
            DispatchError::ServiceNotReady => "service_not_ready",
            DispatchError::NamespaceMissing => "namespace_missing",
            DispatchError::UpstreamProxyFailure(_) => "upstream_proxy_failure",
            DispatchError::Unauthorized(_) => "unauthorized",
            DispatchError::NotFound { .. } => "not_found",
            DispatchError::InternalFailure(_) => "internal_failure",
        }
    }
}

/// A failure waiting for the error stage.
///
/// Travels as a response extension so the stage can log and render it with
/// access to the server's environment.
#[derive(Debug, Clone)]
pub struct FailureReport {
    pub status: StatusCode,
    pub message: String,
    pub kind: &'static str,
}

impl From<&DispatchError> for FailureReport {
    fn from(err: &DispatchError) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
            kind: err.kind(),
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let report = FailureReport::from(&self);
        let mut response = report.status.into_response();
        response.extensions_mut().insert(report);
        response
    }
}
