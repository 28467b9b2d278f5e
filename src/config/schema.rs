//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Transport security policy.
    pub tls: TlsPolicyConfig,

    /// Monitoring reverse proxy settings.
    pub monitoring: MonitoringConfig,

    /// Versioned API settings.
    pub api: ApiConfig,

    /// Health endpoint settings.
    pub health: HealthConfig,

    /// Deferred backing-service initialization.
    pub startup: StartupConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Runtime environment; controls error detail on rendered pages.
    pub environment: Environment,

    /// Debug mode: permissive CORS headers and the `/force-exit` endpoint.
    pub debug: bool,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Optional TLS configuration. When set the listener terminates TLS itself.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Transport security policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsPolicyConfig {
    /// Initial value of the service manager's force-SSL switch.
    pub force_https: bool,

    /// Treat `X-Forwarded-Proto: https` as a secure connection.
    /// Only enable behind a proxy that sets the header itself.
    pub trust_forwarded_proto: bool,
}

impl Default for TlsPolicyConfig {
    fn default() -> Self {
        Self {
            force_https: false,
            trust_forwarded_proto: true,
        }
    }
}

/// Monitoring reverse proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Path prefix served by the monitoring proxy, without trailing slash.
    pub path_prefix: String,

    /// Internal hostname of the monitoring container.
    pub upstream_host: String,

    /// Port of the monitoring container.
    pub upstream_port: u16,

    /// Upstream response timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            path_prefix: "/netdata".to_string(),
            upstream_host: "captain-netdata-container".to_string(),
            upstream_port: 19999,
            timeout_secs: 30,
        }
    }
}

impl MonitoringConfig {
    /// `host:port` authority of the upstream.
    pub fn upstream_authority(&self) -> String {
        format!("{}:{}", self.upstream_host, self.upstream_port)
    }
}

/// Versioned API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// The single API version accepted (e.g., "v1").
    pub version: String,

    /// Also set a matching HTTP status on gate rejections.
    /// Off by default: clients read the status code from the body.
    pub signal_http_status: bool,

    /// Header carrying the tenant namespace.
    pub namespace_header: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: "v1".to_string(),
            signal_http_status: false,
            namespace_header: "x-namespace".to_string(),
        }
    }
}

/// Health endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Path of the health endpoint.
    pub path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            path: "/checkhealth".to_string(),
        }
    }
}

/// Startup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Delay before the backing services are initialized, in milliseconds.
    pub initialize_delay_ms: u64,

    /// Bootstrap attempts before the API is left "not ready".
    pub initialize_attempts: u32,

    /// Pause between failed attempts, in milliseconds.
    pub initialize_retry_ms: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            initialize_delay_ms: 1500,
            initialize_attempts: 3,
            initialize_retry_ms: 5000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_platform_constants() {
        let config = GatewayConfig::default();
        assert_eq!(config.monitoring.path_prefix, "/netdata");
        assert_eq!(config.monitoring.upstream_authority(), "captain-netdata-container:19999");
        assert_eq!(config.api.version, "v1");
        assert_eq!(config.health.path, "/checkhealth");
        assert_eq!(config.startup.initialize_delay_ms, 1500);
        assert_eq!(config.startup.initialize_attempts, 3);
        assert!(!config.api.signal_http_status);
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            debug = true
            environment = "development"

            [monitoring]
            upstream_host = "127.0.0.1"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert!(config.debug);
        assert!(config.environment.is_development());
        assert_eq!(config.monitoring.upstream_host, "127.0.0.1");
        assert_eq!(config.monitoring.upstream_port, 19999);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
    }
}
