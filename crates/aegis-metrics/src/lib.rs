//! Aegis Metrics - Batch Metrics Query Engine
//!
//! Sits between a decoded batch of metric queries and the raw table scans.
//! Resolves each query against the time-series or aggregates tables, merges
//! and derives values across series, fills missing samples, and returns one
//! result per query in input order.
//!
//! Key Features:
//! - Lazily populated, share-once cache of time-series table handles
//! - Dense gap-filled time series from any number of stored series
//! - Derived ratio metric computed from two aligned series
//! - Per-query failure isolation
//! - Application deletion across both table kinds
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

pub mod cache;
pub mod derived;
pub mod processor;
pub mod request;
pub mod response;

pub use cache::TableCache;
pub use derived::DerivedMetric;
pub use processor::BatchMetricsProcessor;
pub use request::{AggregateQuery, MetricQuery, TimeSeriesQuery};
pub use response::{AggregateResponse, BatchEntry, MetricsResult, TimeSeriesResponse};
