//! Backing-service manager.
//!
//! # Data Flow
//! ```text
//! main.rs constructs ServiceManager (one per process)
//!     → Arc handed to the HTTP server and the context injector
//!     → lifecycle::startup schedules initialize() after a delay
//!     → health endpoint reads health_check_id()
//!     → context injector reads is_ready() and force_ssl()
//! ```

pub mod manager;

pub use manager::{
    BootstrapFuture, InstanceHealthId, NoopBootstrap, ServiceBootstrap, ServiceError,
    ServiceManager, ServiceState,
};
