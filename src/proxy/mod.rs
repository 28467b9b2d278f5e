//! Monitoring reverse proxy.
//!
//! # Data Flow
//! ```text
//! monitoring gate (canonical path, session identity checked)
//!     → ProxyExchange::new(request id, context's ProxyErrorGuard)
//!     → forwarder.rs (hyper client → http://<internal-host>:<port>/...)
//!         ok    → upstream response written to the exchange
//!         error → guard.rs ProxyErrorChannel → PlainTextResponder
//!                 (first event writes 500 text/plain, later events ignored)
//!     → exchange response returned to the client
//! ```
//!
//! # Design Decisions
//! - One error channel per process, built at startup with its handler
//! - Per-request idempotence through the request's own guard flag
//! - No retries and no body buffering: the upstream sees the original stream

pub mod forwarder;
pub mod guard;

pub use forwarder::{ForwardError, MonitoringForwarder};
pub use guard::{PlainTextResponder, ProxyErrorChannel, ProxyErrorHandler, ProxyExchange};
