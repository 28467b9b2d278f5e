//! Versioned JSON API surface.
//!
//! # Data Flow
//! ```text
//! /api/<version>/...
//!     → http::middleware::api_gate (version, readiness, namespace)
//!     → routers.rs
//!         /<version>/login/...  → login router (unauthenticated)
//!         /<version>/user/...   → user router (identity + tenant scoped)
//!     → terminal not-found when neither matches
//! ```
//!
//! The routers themselves are supplied by the embedding application; this
//! module only owns the envelope and the mount points.

pub mod response;
pub mod routers;

pub use response::{ApiResponse, ApiStatusCode, UnknownStatusCode};
pub use routers::DomainRouters;
