//! HTTP dispatch pipeline.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, layer order, graceful shutdown)
//!     → request.rs (request id assigned and echoed)
//!     → middleware/ (debug, context, TLS, API gate)
//!     → health.rs | monitoring.rs | domain routers
//!     → terminal.rs (not found, error page)
//!     → Send to client
//! ```

pub mod health;
pub mod middleware;
pub mod monitoring;
pub mod request;
pub mod server;
pub mod terminal;

pub use request::X_REQUEST_ID;
pub use server::{build_router, AppState, HttpServer, Services};
