//! Aegis Common - Shared Types and Utilities
//!
//! Foundational types, error handling, and configuration used across the
//! Aegis metrics components. Provides the core abstractions that keep the
//! store layer, the batch query engine, and the API server consistent.
//!
//! Key Features:
//! - Unified error type with user vs system error classification
//! - Metric scopes and resolution identifiers
//! - Engine configuration loadable from TOML
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

pub mod config;
pub mod error;
pub mod types;

pub use config::{DerivedMetricConfig, MetricsConfig};
pub use error::{AegisError, Result};
pub use types::*;
