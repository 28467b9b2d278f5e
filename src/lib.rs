//! Captain front-door dispatcher.
//!
//! Sits in front of the captain API and the monitoring dashboard: forces
//! HTTPS when asked, proxies the monitoring UI for logged-in sessions, gates
//! the versioned API on readiness and tenant, and renders everything else
//! as a terminal 404 or error page.

// Core pipeline
pub mod api;
pub mod context;
pub mod error;
pub mod http;
pub mod proxy;

// Collaborators and infrastructure
pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod service;

pub use config::GatewayConfig;
pub use error::DispatchError;
pub use http::{HttpServer, Services};
pub use lifecycle::Shutdown;
pub use service::ServiceManager;
