//! Aegis Config - Configuration Structures
//!
//! Configuration for the batch metrics engine. Supports loading from TOML
//! files and programmatic construction, with defaults that match a single
//! per-second resolution deployment.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::types::{MetricsScope, DEFAULT_RESOLUTION};
use crate::{AegisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// =============================================================================
// Derived Metric Configuration
// =============================================================================

/// Names of the derived ratio metric and the two series it is computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivedMetricConfig {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
}

impl Default for DerivedMetricConfig {
    fn default() -> Self {
        Self {
            name: "busyness".to_string(),
            numerator: "tuples.read".to_string(),
            denominator: "events.processed".to_string(),
        }
    }
}

// =============================================================================
// Metrics Configuration
// =============================================================================

/// Configuration for the batch metrics engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub scope: MetricsScope,
    /// Time-series resolutions (seconds per bucket) queries may ask for.
    pub resolutions: Vec<u32>,
    /// When false, the first failing query aborts the whole batch.
    pub isolate_failures: bool,
    pub derived: DerivedMetricConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            scope: MetricsScope::Reactor,
            resolutions: vec![DEFAULT_RESOLUTION],
            isolate_failures: true,
            derived: DerivedMetricConfig::default(),
        }
    }
}

impl MetricsConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text and validate it.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| AegisError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.resolutions.iter().any(|r| *r == 0) {
            return Err(AegisError::Configuration(
                "resolutions must be positive".to_string(),
            ));
        }
        if !self.resolutions.contains(&DEFAULT_RESOLUTION) {
            return Err(AegisError::Configuration(format!(
                "resolutions must include the default resolution {}",
                DEFAULT_RESOLUTION
            )));
        }
        if self.derived.name.is_empty() {
            return Err(AegisError::Configuration(
                "derived metric name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Configured resolutions, the default first and the rest ascending.
    pub fn ordered_resolutions(&self) -> Vec<u32> {
        let mut rest: Vec<u32> = self
            .resolutions
            .iter()
            .copied()
            .filter(|r| *r != DEFAULT_RESOLUTION)
            .collect();
        rest.sort_unstable();
        rest.dedup();

        let mut order = vec![DEFAULT_RESOLUTION];
        order.extend(rest);
        order
    }

    pub fn supports_resolution(&self, resolution: u32) -> bool {
        self.resolutions.contains(&resolution)
    }

    pub fn with_resolutions(mut self, resolutions: Vec<u32>) -> Self {
        self.resolutions = resolutions;
        self
    }

    pub fn with_isolate_failures(mut self, isolate: bool) -> Self {
        self.isolate_failures = isolate;
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
