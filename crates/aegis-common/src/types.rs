//! Aegis Types - Core Data Types
//!
//! Fundamental data types shared by the metrics store layer and the query
//! engine.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Metrics Scope
// =============================================================================

/// Family of metrics a table belongs to. Tables of different scopes never
/// share data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetricsScope {
    /// Metrics emitted by running applications.
    #[default]
    Reactor,
    /// Metrics emitted by user code.
    User,
    /// Metrics about the platform itself.
    System,
}

impl MetricsScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricsScope::Reactor => "reactor",
            MetricsScope::User => "user",
            MetricsScope::System => "system",
        }
    }
}

impl fmt::Display for MetricsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolution of the table every query falls back to, and the one deletion
/// always starts with.
pub const DEFAULT_RESOLUTION: u32 = 1;

/// Returns true if `value` equals `prefix` or is one of its dot-separated
/// children. An empty prefix matches everything.
///
/// Contexts (`app.flow.flowlet`) and metric names (`process.events.in`) are
/// both matched this way.
pub fn is_segment_prefix(value: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match value.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

// =============================================================================
// Tests
// =============================================================================
