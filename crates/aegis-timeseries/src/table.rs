//! Aegis Metrics Tables
//!
//! Contracts of the two table kinds the batch engine reads from, and of the
//! factory that opens them.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::types::{AggregateValue, MetricsRecord, MetricsScanQuery, MetricsScanResult};
use aegis_common::{MetricsScope, Result};
use std::sync::Arc;

// =============================================================================
// Time Series Table
// =============================================================================

/// Table of per-timestamp metric values at one resolution.
pub trait TimeSeriesTable: Send + Sync {
    /// Seconds covered by one stored bucket.
    fn resolution(&self) -> u32;

    /// Return every stored series matching the query, each restricted to the
    /// query's time range and sorted by timestamp. Series order is
    /// unspecified.
    fn scan(&self, query: &MetricsScanQuery) -> Result<Vec<MetricsScanResult>>;

    /// Add the records' values into their timestamp buckets.
    fn save(&self, records: &[MetricsRecord]) -> Result<()>;

    /// Remove every series whose context belongs to `app_id`.
    fn delete(&self, app_id: &str) -> Result<()>;
}

// =============================================================================
// Aggregates Table
// =============================================================================

/// Table of running totals, one row per context, metric, run and tag.
pub trait AggregatesTable: Send + Sync {
    /// Return the rows matching the filters. A `None` run id matches every
    /// run; a `None` tag prefix matches untagged rows only.
    fn scan(
        &self,
        context_prefix: &str,
        metric_prefix: &str,
        run_id: Option<&str>,
        tag_prefix: Option<&str>,
    ) -> Result<Vec<AggregateValue>>;

    /// Add the records' values to their running totals.
    fn update(&self, records: &[MetricsRecord]) -> Result<()>;

    /// Remove every row whose context belongs to `app_id`.
    fn delete(&self, app_id: &str) -> Result<()>;
}

// =============================================================================
// Table Factory
// =============================================================================

/// Opens metrics tables. Implementations may hand out a new handle per call;
/// callers that want sharing cache the handles themselves.
pub trait MetricsTableFactory: Send + Sync {
    fn create_time_series(
        &self,
        scope: MetricsScope,
        resolution: u32,
    ) -> Result<Arc<dyn TimeSeriesTable>>;

    fn create_aggregates(&self, scope: MetricsScope) -> Result<Arc<dyn AggregatesTable>>;
}
