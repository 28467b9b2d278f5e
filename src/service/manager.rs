//! Backing-service lifecycle.
//!
//! # States
//! ```text
//! Starting → Initializing → Ready → Stopped
//!               │
//!               └── bootstrap failed → Starting (may retry)
//! ```
//!
//! # Design Decisions
//! - One instance per process, shared through `Arc`, never looked up globally
//! - State lives in atomics; `initialize` wins the Starting → Initializing
//!   transition with a compare-exchange so concurrent callers cannot both run
//!   the bootstrap
//! - The health id is fixed at construction

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

/// Lifecycle state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Starting = 0,
    Initializing = 1,
    Ready = 2,
    Stopped = 3,
}

impl From<u8> for ServiceState {
    fn from(val: u8) -> Self {
        match val {
            1 => ServiceState::Initializing,
            2 => ServiceState::Ready,
            3 => ServiceState::Stopped,
            _ => ServiceState::Starting,
        }
    }
}

/// Errors from the service lifecycle.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("bootstrap failed: {0}")]
    Bootstrap(String),

    #[error("initialization already in progress")]
    AlreadyInitializing,

    #[error("service manager is stopped")]
    Stopped,
}

/// Identifier of this running instance, stable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHealthId(Uuid);

impl InstanceHealthId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for InstanceHealthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type BootstrapFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ServiceError>> + Send + 'a>>;

/// Brings up the platform's backing services (container orchestration,
/// certificates, registries). Implemented outside this crate.
pub trait ServiceBootstrap: Send + Sync + 'static {
    fn bootstrap(&self) -> BootstrapFuture<'_>;
}

/// Bootstrap with nothing to do.
#[derive(Debug, Default)]
pub struct NoopBootstrap;

impl ServiceBootstrap for NoopBootstrap {
    fn bootstrap(&self) -> BootstrapFuture<'_> {
        Box::pin(async { Ok(()) })
    }
}

/// Process-wide owner of the backing services.
pub struct ServiceManager {
    health_check_id: InstanceHealthId,
    state: AtomicU8,
    force_ssl: AtomicBool,
    bootstrap: Arc<dyn ServiceBootstrap>,
}

impl ServiceManager {
    pub fn new(force_ssl: bool) -> Self {
        Self::with_bootstrap(force_ssl, Arc::new(NoopBootstrap))
    }

    pub fn with_bootstrap(force_ssl: bool, bootstrap: Arc<dyn ServiceBootstrap>) -> Self {
        Self {
            health_check_id: InstanceHealthId::generate(),
            state: AtomicU8::new(ServiceState::Starting as u8),
            force_ssl: AtomicBool::new(force_ssl),
            bootstrap,
        }
    }

    pub fn health_check_id(&self) -> InstanceHealthId {
        self.health_check_id
    }

    pub fn state(&self) -> ServiceState {
        ServiceState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ServiceState::Ready
    }

    pub fn force_ssl(&self) -> bool {
        self.force_ssl.load(Ordering::Relaxed)
    }

    pub fn set_force_ssl(&self, enabled: bool) {
        self.force_ssl.store(enabled, Ordering::Relaxed);
        tracing::info!(force_ssl = enabled, "Force-SSL switch updated");
    }

    /// Run the bootstrap once. Calling again after success is a no-op.
    pub async fn initialize(&self) -> Result<(), ServiceError> {
        if let Err(current) = self.state.compare_exchange(
            ServiceState::Starting as u8,
            ServiceState::Initializing as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            return match ServiceState::from(current) {
                ServiceState::Ready => Ok(()),
                ServiceState::Initializing => Err(ServiceError::AlreadyInitializing),
                _ => Err(ServiceError::Stopped),
            };
        }

        tracing::info!(health_check_id = %self.health_check_id, "Initializing backing services");

        match self.bootstrap.bootstrap().await {
            Ok(()) => {
                // shutdown() may have raced us; Stopped wins.
                if self
                    .state
                    .compare_exchange(
                        ServiceState::Initializing as u8,
                        ServiceState::Ready as u8,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_err()
                {
                    return Err(ServiceError::Stopped);
                }
                tracing::info!("Backing services ready");
                Ok(())
            }
            Err(e) => {
                let _ = self.state.compare_exchange(
                    ServiceState::Initializing as u8,
                    ServiceState::Starting as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                tracing::error!(error = %e, "Backing service initialization failed");
                Err(e)
            }
        }
    }

    pub fn shutdown(&self) {
        let previous = ServiceState::from(
            self.state
                .swap(ServiceState::Stopped as u8, Ordering::AcqRel),
        );
        tracing::info!(previous = ?previous, "Service manager stopped");
    }
}

impl fmt::Debug for ServiceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceManager")
            .field("health_check_id", &self.health_check_id)
            .field("state", &self.state())
            .field("force_ssl", &self.force_ssl())
            .finish()
    }
}
