//! Pipeline middleware.
//!
//! # Data Flow
//! ```text
//! debug.rs     → CORS headers and /force-exit (debug mode only)
//! context.rs   → RequestContext into request extensions
//! tls.rs       → HTTPS redirect when the context requires TLS
//! api_gate.rs  → version / readiness / namespace checks under /api
//! ```

pub mod api_gate;
pub mod context;
pub mod debug;
pub mod tls;

pub use api_gate::api_gate;
pub use context::inject_context;
pub use debug::debug_gate;
pub use tls::enforce_tls;
