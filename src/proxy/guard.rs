//! Proxy error channel and the per-request error guard.
//!
//! # Responsibilities
//! - Hold the single failure handler for the forwarding transport
//! - Answer a failed exchange with one plain-text 500
//! - Suppress repeated failure events for the same exchange
//!
//! # Design Decisions
//! - The handler is fixed when the channel is constructed, so it exists
//!   exactly once per process and is never re-registered per request
//! - Idempotence is per exchange: the flag lives in the request's
//!   `ProxyErrorGuard`, a global flag would swallow later requests' errors
//! - An exchange accepts one response; later writes are refused

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};

use crate::context::ProxyErrorGuard;
use crate::observability::metrics;
use crate::proxy::ForwardError;

/// The response side of one forwarded request.
pub struct ProxyExchange {
    request_id: String,
    guard: ProxyErrorGuard,
    slot: Mutex<Slot>,
}

#[derive(Default)]
struct Slot {
    written: bool,
    response: Option<Response>,
}

impl ProxyExchange {
    pub fn new(request_id: impl Into<String>, guard: ProxyErrorGuard) -> Self {
        Self {
            request_id: request_id.into(),
            guard,
            slot: Mutex::new(Slot::default()),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn guard(&self) -> &ProxyErrorGuard {
        &self.guard
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store the response. Returns `false` if one was already written.
    pub fn write(&self, response: Response) -> bool {
        let mut slot = self.slot();
        if slot.written {
            tracing::debug!(request_id = %self.request_id, "Exchange already answered, dropping write");
            return false;
        }
        slot.written = true;
        slot.response = Some(response);
        true
    }

    pub fn is_written(&self) -> bool {
        self.slot().written
    }

    /// Take the stored response for sending.
    pub fn take_response(&self) -> Option<Response> {
        self.slot().response.take()
    }
}

impl std::fmt::Debug for ProxyExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyExchange")
            .field("request_id", &self.request_id)
            .field("guard", &self.guard)
            .field("written", &self.is_written())
            .finish()
    }
}

/// Reacts to forwarding failures.
pub trait ProxyErrorHandler: Send + Sync + 'static {
    fn on_error(&self, error: Option<&ForwardError>, exchange: &ProxyExchange);
}

/// Answers the first failure of an exchange with a plain-text 500.
#[derive(Debug, Default)]
pub struct PlainTextResponder;

impl PlainTextResponder {
    fn body(error: Option<&ForwardError>) -> String {
        let detail = error.map_or_else(|| "NULL".to_string(), ToString::to_string);
        format!("Something went wrong... err: \n {detail}")
    }

    /// Answer the failure if it is the exchange's first and nothing was
    /// written yet. Returns whether a 500 was written.
    fn respond(&self, error: Option<&ForwardError>, exchange: &ProxyExchange) -> bool {
        if !exchange.guard().mark_handled() {
            tracing::debug!(request_id = %exchange.request_id(), "Proxy error already handled");
            return false;
        }
        if exchange.is_written() {
            tracing::debug!(request_id = %exchange.request_id(), "Proxy error after upstream response, ignored");
            return false;
        }

        let mut response = Response::new(Body::from(Self::body(error)));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        if !exchange.write(response) {
            return false;
        }

        match error {
            Some(e) => tracing::error!(request_id = %exchange.request_id(), error = %e, "Monitoring proxy failed"),
            None => tracing::error!(request_id = %exchange.request_id(), "Monitoring proxy failed without error detail"),
        }
        metrics::record_proxy_error();
        true
    }
}

impl ProxyErrorHandler for PlainTextResponder {
    fn on_error(&self, error: Option<&ForwardError>, exchange: &ProxyExchange) {
        self.respond(error, exchange);
    }
}

/// The forwarding transport's shared error channel.
#[derive(Clone)]
pub struct ProxyErrorChannel {
    handler: Arc<dyn ProxyErrorHandler>,
}

impl ProxyErrorChannel {
    pub fn new(handler: Arc<dyn ProxyErrorHandler>) -> Self {
        Self { handler }
    }

    /// Deliver a failure event for `exchange`.
    pub fn emit(&self, error: Option<&ForwardError>, exchange: &ProxyExchange) {
        self.handler.on_error(error, exchange);
    }
}

impl Default for ProxyErrorChannel {
    fn default() -> Self {
        Self::new(Arc::new(PlainTextResponder))
    }
}

impl std::fmt::Debug for ProxyErrorChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyErrorChannel").finish_non_exhaustive()
    }
}
