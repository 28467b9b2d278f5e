//! HTTP server setup.
//!
//! # Responsibilities
//! - Assemble the dispatch pipeline into one Axum router
//! - Own the shared state handed to every stage
//! - Serve over plain TCP or TLS with graceful shutdown
//!
//! # Pipeline (outermost first)
//! ```text
//! request id → trace → timeout → propagate id
//!     → debug CORS / force-exit        (debug only)
//!     → error stage                    (renders FailureReport)
//!     → catch panic                    (panic → InternalFailure)
//!     → context injection
//!     → TLS enforcement
//!     → routes:
//!         <health path>                → health
//!         <prefix>, <prefix>/...       → monitoring gate → forwarder
//!         /api/...                     → API gate → slash trim → domain routers
//!         anything else                → not found
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderName, StatusCode},
    middleware,
    routing::{any, get},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, normalize_path::NormalizePathLayer, timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api::DomainRouters;
use crate::config::{validate_config, ConfigError, GatewayConfig, ValidationError};
use crate::context::{Anonymous, ContextInjector, IdentityResolver};
use crate::http::{
    health::health,
    middleware::{api_gate, debug_gate, enforce_tls, inject_context},
    monitoring::monitoring_gate,
    request::{propagate_request_id, set_request_id},
    terminal::{error_stage, handle_panic, not_found},
};
use crate::lifecycle::{shutdown, Shutdown};
use crate::proxy::{MonitoringForwarder, ProxyErrorChannel};
use crate::service::ServiceManager;

/// Collaborators supplied by the embedding application.
pub struct Services {
    pub manager: Arc<ServiceManager>,
    pub identity: Arc<dyn IdentityResolver>,
    pub routers: DomainRouters,
}

impl Services {
    /// Anonymous identity and empty domain routers.
    pub fn new(manager: Arc<ServiceManager>) -> Self {
        Self {
            manager,
            identity: Arc::new(Anonymous),
            routers: DomainRouters::default(),
        }
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityResolver>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_routers(mut self, routers: DomainRouters) -> Self {
        self.routers = routers;
        self
    }
}

/// State shared by every pipeline stage.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub manager: Arc<ServiceManager>,
    pub injector: ContextInjector,
    pub forwarder: MonitoringForwarder,
    pub shutdown: Shutdown,
}

impl AppState {
    /// The listener itself terminates TLS.
    pub fn listener_tls(&self) -> bool {
        self.config.listener.tls.is_some()
    }
}

/// HTTP front door of the captain.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
    shutdown: Shutdown,
}

impl HttpServer {
    /// Validate `config` and build the pipeline.
    ///
    /// The proxy error channel is created here, once, with its handler.
    pub fn new(
        config: GatewayConfig,
        services: Services,
        shutdown: Shutdown,
    ) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let namespace_header = HeaderName::from_bytes(config.api.namespace_header.as_bytes())
            .map_err(|_| {
                ConfigError::Validation(vec![ValidationError::InvalidHeaderName {
                    field: "api.namespace_header",
                    value: config.api.namespace_header.clone(),
                }])
            })?;
        let injector = ContextInjector::new(
            services.identity,
            services.manager.clone(),
            namespace_header,
        );
        let forwarder = MonitoringForwarder::new(&config.monitoring, ProxyErrorChannel::default());

        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            manager: services.manager,
            injector,
            forwarder,
            shutdown: shutdown.clone(),
        };

        let router = build_router(state, services.routers);
        Ok(Self {
            router,
            config,
            shutdown,
        })
    }

    /// The assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve plain HTTP on `listener` until shutdown is triggered.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(self.shutdown.subscribe()))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until shutdown is triggered.
    pub async fn run_tls(self, addr: SocketAddr, tls: RustlsConfig) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let rx = self.shutdown.subscribe();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown::wait(rx).await;
            drain.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(
                self.router
                    .into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Assemble the full pipeline around `state`.
pub fn build_router(state: AppState, routers: DomainRouters) -> Router {
    let config = state.config.clone();
    let prefix = config.monitoring.path_prefix.as_str();

    // The gate sees the raw path; mounted routers see it without a
    // trailing slash, so `/v1/login/` reaches the login router's `/`.
    let api = ServiceBuilder::new()
        .layer(middleware::from_fn_with_state(state.clone(), api_gate))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .service(routers.mount(&config.api.version).fallback(not_found));

    let router = Router::new()
        .route(&config.health.path, get(health))
        .route(prefix, any(monitoring_gate))
        .route(&format!("{prefix}/"), any(monitoring_gate))
        .route(&format!("{prefix}/{{*rest}}"), any(monitoring_gate))
        .nest_service("/api", api)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), enforce_tls))
        .layer(middleware::from_fn_with_state(state.clone(), inject_context))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(state.clone(), error_stage));

    let router = if config.debug {
        tracing::warn!("Debug mode: permissive CORS and /force-exit enabled");
        router.layer(middleware::from_fn_with_state(state.clone(), debug_gate))
    } else {
        router
    };

    router
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(config.timeouts.request_secs),
                ))
                .layer(propagate_request_id()),
        )
        .with_state(state)
}
