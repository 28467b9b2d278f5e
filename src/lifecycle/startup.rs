//! Startup orchestration.
//!
//! # Responsibilities
//! - Defer backing-service initialization until the surrounding
//!   infrastructure (container network, service discovery) can see us
//! - Retry a failed bootstrap a bounded number of times
//! - Cancel the pending initialization if shutdown starts first
//!
//! # Design Decisions
//! - One spawned task, never a blocking sleep on the startup path
//! - Listeners start before initialization: the health endpoint answers
//!   while the API gate still reports "not ready"
//! - Only bootstrap failures are retried; a concurrent or stopped manager
//!   ends the task

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::StartupConfig;
use crate::service::{ServiceError, ServiceManager};

/// When and how often the deferred `initialize()` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeSchedule {
    pub delay: Duration,
    pub attempts: u32,
    pub retry_delay: Duration,
}

impl InitializeSchedule {
    /// A single attempt after `delay`.
    pub fn once(delay: Duration) -> Self {
        Self {
            delay,
            attempts: 1,
            retry_delay: Duration::ZERO,
        }
    }
}

impl From<&StartupConfig> for InitializeSchedule {
    fn from(config: &StartupConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.initialize_delay_ms),
            attempts: config.initialize_attempts.max(1),
            retry_delay: Duration::from_millis(config.initialize_retry_ms),
        }
    }
}

/// Spawn the deferred `initialize()` call.
pub fn schedule_initialize(
    manager: Arc<ServiceManager>,
    schedule: InitializeSchedule,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tracing::info!(
        delay_ms = schedule.delay.as_millis() as u64,
        attempts = schedule.attempts,
        "Backing service initialization scheduled"
    );

    tokio::spawn(async move {
        tokio::select! {
            _ = initialize_with_retries(&manager, schedule) => {}
            _ = shutdown.recv() => {
                tracing::info!("Shutdown before initialization finished, skipping");
            }
        }
    })
}

async fn initialize_with_retries(manager: &ServiceManager, schedule: InitializeSchedule) {
    tokio::time::sleep(schedule.delay).await;

    let attempts = schedule.attempts.max(1);
    for attempt in 1..=attempts {
        match manager.initialize().await {
            Ok(()) => return,
            Err(e @ ServiceError::Bootstrap(_)) if attempt < attempts => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    retry_in_ms = schedule.retry_delay.as_millis() as u64,
                    "Initialization failed, retrying"
                );
                tokio::time::sleep(schedule.retry_delay).await;
            }
            Err(e) => {
                tracing::error!(error = %e, attempt, "Deferred initialization did not complete");
                return;
            }
        }
    }
}
