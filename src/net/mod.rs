//! Network layer.
//!
//! # Data Flow
//! ```text
//! listener.tls configured?
//!     yes → tls.rs (PEM → RustlsConfig) → HttpServer::run_tls
//!     no  → tokio TcpListener            → HttpServer::run
//! ```
//!
//! A TLS listener marks every request it accepts as secure, so the TLS
//! enforcement stage never redirects its traffic.

pub mod tls;

pub use tls::load_tls_config;
