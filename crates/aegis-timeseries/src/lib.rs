//! Aegis Time Series - Metrics Tables
//!
//! Storage-facing half of the Aegis metrics engine. Defines the contracts of
//! the time-series and aggregates tables, ships in-memory implementations of
//! both, and provides the cursor-based merge that turns sparse table scans
//! into dense series.
//!
//! Key Features:
//! - Time-series tables keyed by resolution with ordered scans
//! - Running-aggregate tables with run and tag filters
//! - Single-pass gap-filling merge over any number of sorted sequences
//! - Overflow-safe sum reduction
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

pub mod aggregation;
pub mod memory;
pub mod table;
pub mod types;

pub use aggregation::{SeriesMerger, SumAggregator, TimeValueCursor};
pub use memory::{InMemoryAggregatesTable, InMemoryTableFactory, InMemoryTimeSeriesTable};
pub use table::{AggregatesTable, MetricsTableFactory, TimeSeriesTable};
pub use types::{
    AggregateValue, MetricsRecord, MetricsScanQuery, MetricsScanQueryBuilder, MetricsScanResult,
    TagValue, TimeValue,
};
