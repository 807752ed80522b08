//! Aegis Metric Responses
//!
//! Result shapes returned for each query of a batch.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use aegis_timeseries::TimeValue;
use serde::{Deserialize, Serialize};

// =============================================================================
// Time Series Response
// =============================================================================

/// Dense series: one sample for every step of the query window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesResponse {
    pub start: i64,
    pub end: i64,
    pub data: Vec<TimeValue>,
}

impl TimeSeriesResponse {
    pub fn new(start: i64, end: i64, data: Vec<TimeValue>) -> Self {
        Self { start, end, data }
    }

    pub fn values(&self) -> Vec<i64> {
        self.data.iter().map(|tv| tv.value).collect()
    }
}

// =============================================================================
// Aggregate Response
// =============================================================================

/// Running total of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResponse {
    pub data: i64,
}

impl AggregateResponse {
    pub fn new(data: i64) -> Self {
        Self { data }
    }
}

// =============================================================================
// Batch Entry
// =============================================================================

/// Result of one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricsResult {
    TimeSeries(TimeSeriesResponse),
    Aggregate(AggregateResponse),
}

impl From<TimeSeriesResponse> for MetricsResult {
    fn from(response: TimeSeriesResponse) -> Self {
        MetricsResult::TimeSeries(response)
    }
}

impl From<AggregateResponse> for MetricsResult {
    fn from(response: AggregateResponse) -> Self {
        MetricsResult::Aggregate(response)
    }
}

/// One element of a batch response. Exactly one of `result` and `error` is
/// set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub path: String,
    pub result: Option<MetricsResult>,
    pub error: Option<String>,
}

impl BatchEntry {
    pub fn success(path: impl Into<String>, result: impl Into<MetricsResult>) -> Self {
        Self {
            path: path.into(),
            result: Some(result.into()),
            error: None,
        }
    }

    pub fn failure(path: impl Into<String>, error: impl ToString) -> Self {
        Self {
            path: path.into(),
            result: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

// =============================================================================
// Tests
// =============================================================================
