//! Aegis Server Configuration
//!
//! Server configuration management for binding, request limits, and the
//! metrics engine settings.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use aegis_common::{AegisError, MetricsConfig, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

// =============================================================================
// Server Configuration
// =============================================================================

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
    pub enable_cors: bool,
    /// Upper bound on the sample count of a single time series request.
    pub max_samples_per_query: usize,
    pub metrics: MetricsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9090,
            body_limit_bytes: 1024 * 1024, // 1MB
            enable_cors: true,
            max_samples_per_query: 86_400,
            metrics: MetricsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new server config with the specified host and port.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| AegisError::Configuration(e.to_string()))?;
        config.metrics.validate()?;
        Ok(config)
    }

    /// Get the socket address for binding.
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], self.port)))
    }

    /// Override host and port, e.g. from command-line flags.
    pub fn with_address(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_max_samples(mut self, max: usize) -> Self {
        self.max_samples_per_query = max;
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
