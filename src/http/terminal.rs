//! Terminal handling: not-found and the error stage.
//!
//! # Responsibilities
//! - Turn unmatched requests into `NotFound` failures
//! - Turn handler panics into `InternalFailure`
//! - Log each failure once and render the generic error page
//!
//! # Design Decisions
//! - Failures travel as a `FailureReport` response extension; handlers
//!   never render error pages themselves
//! - Outside development only the status line is rendered

use std::any::Any;

use axum::{
    body::Body,
    extract::{OriginalUri, State},
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::Environment;
use crate::error::{DispatchError, FailureReport};
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Fallback for every request no stage claimed.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> DispatchError {
    DispatchError::NotFound {
        path: uri.path().to_string(),
    }
}

/// Panic hook for `CatchPanicLayer`.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };
    DispatchError::InternalFailure(detail).into_response()
}

/// Render any `FailureReport` left on the response.
pub async fn error_stage(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let request_id = request_id(req.headers()).to_string();
    let path = req.uri().path().to_string();

    let mut response = next.run(req).await;
    let Some(report) = response.extensions_mut().remove::<FailureReport>() else {
        return response;
    };

    if report.status.is_server_error() {
        tracing::error!(
            request_id = %request_id,
            path = %path,
            status = report.status.as_u16(),
            kind = report.kind,
            error = %report.message,
            "Request failed"
        );
    } else {
        tracing::warn!(
            request_id = %request_id,
            path = %path,
            status = report.status.as_u16(),
            kind = report.kind,
            error = %report.message,
            "Request failed"
        );
    }
    metrics::record_failure(report.status.as_u16(), report.kind);

    render_error_page(&report, state.config.environment)
}

/// The generic HTML error page.
pub fn render_error_page(report: &FailureReport, environment: Environment) -> Response {
    let reason = report.status.canonical_reason().unwrap_or("Error");
    let (heading, detail) = if environment.is_development() {
        (
            escape_html(&report.message),
            format!("<pre>{}</pre>", escape_html(report.kind)),
        )
    } else {
        (reason.to_string(), String::new())
    };

    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{status} {reason}</title></head>\n\
         <body>\n<h1>{heading}</h1>\n<h2>{status}</h2>\n{detail}\n</body>\n</html>\n",
        status = report.status.as_u16(),
    );

    let mut response = Response::new(Body::from(html));
    *response.status_mut() = report.status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
