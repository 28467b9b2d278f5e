//! Forwarding transport for the monitoring service.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the fixed internal upstream
//! - Send method, headers and body unchanged
//! - Stream the upstream response back without buffering
//! - Route every failure through the shared [`ProxyErrorChannel`]

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, Response, Uri, Version},
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::MonitoringConfig;
use crate::observability::metrics;
use crate::proxy::guard::{ProxyErrorChannel, ProxyExchange};

/// Ways a forwarded request can fail before a response arrives.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid upstream URI: {0}")]
    InvalidUri(#[from] axum::http::Error),

    #[error("upstream connection error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),
}

/// Reverse proxy onto the monitoring container.
#[derive(Debug, Clone)]
pub struct MonitoringForwarder {
    client: Client<HttpConnector, Body>,
    authority: String,
    timeout: Duration,
    errors: ProxyErrorChannel,
}

impl MonitoringForwarder {
    pub fn new(config: &MonitoringConfig, errors: ProxyErrorChannel) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            client,
            authority: config.upstream_authority(),
            timeout: Duration::from_secs(config.timeout_secs),
            errors,
        }
    }

    /// `http://<upstream>` followed by the original path and query.
    pub fn target_uri(&self, original: &Uri) -> Result<Uri, ForwardError> {
        let path_and_query = original
            .path_and_query()
            .map_or("/", |pq| pq.as_str());

        Ok(Uri::builder()
            .scheme("http")
            .authority(self.authority.as_str())
            .path_and_query(path_and_query)
            .build()?)
    }

    /// Forward `request` and record the outcome on `exchange`.
    ///
    /// On success the upstream response is written to the exchange; on any
    /// failure the error channel is notified instead. Dropping the returned
    /// future (client went away) abandons the upstream request silently.
    pub async fn forward(&self, request: Request<Body>, exchange: &ProxyExchange) {
        let (mut parts, body) = request.into_parts();

        parts.uri = match self.target_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                self.errors.emit(Some(&e), exchange);
                return;
            }
        };
        // The pooled client speaks HTTP/1.1 to the upstream regardless of
        // what the client negotiated with us.
        parts.version = Version::HTTP_11;

        tracing::debug!(
            request_id = %exchange.request_id(),
            method = %parts.method,
            uri = %parts.uri,
            "Forwarding to monitoring upstream"
        );

        let upstream = Request::from_parts(parts, body);
        match tokio::time::timeout(self.timeout, self.client.request(upstream)).await {
            Ok(Ok(response)) => {
                metrics::record_proxy_response(response.status().as_u16());
                exchange.write(relay(response));
            }
            Ok(Err(e)) => self.errors.emit(Some(&ForwardError::Transport(e)), exchange),
            Err(_) => self
                .errors
                .emit(Some(&ForwardError::Timeout(self.timeout)), exchange),
        }
    }
}

/// Re-wrap the upstream body for Axum without buffering it.
fn relay(response: hyper::Response<Incoming>) -> Response<Body> {
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(body))
}
