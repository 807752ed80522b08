//! Aegis Metric Queries
//!
//! Decoded form of one batch element. Queries are built by the transport
//! layer and never change afterwards.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use aegis_common::DEFAULT_RESOLUTION;
use serde::{Deserialize, Serialize};

// =============================================================================
// Metric Query
// =============================================================================

/// One query of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricQuery {
    TimeSeries(TimeSeriesQuery),
    Aggregate(AggregateQuery),
}

impl MetricQuery {
    /// Source identifier the result is reported under.
    pub fn path(&self) -> &str {
        match self {
            MetricQuery::TimeSeries(query) => &query.path,
            MetricQuery::Aggregate(query) => &query.path,
        }
    }

    pub fn context_prefix(&self) -> &str {
        match self {
            MetricQuery::TimeSeries(query) => &query.context_prefix,
            MetricQuery::Aggregate(query) => &query.context_prefix,
        }
    }

    pub fn metric_prefix(&self) -> &str {
        match self {
            MetricQuery::TimeSeries(query) => &query.metric_prefix,
            MetricQuery::Aggregate(query) => &query.metric_prefix,
        }
    }
}

impl From<TimeSeriesQuery> for MetricQuery {
    fn from(query: TimeSeriesQuery) -> Self {
        MetricQuery::TimeSeries(query)
    }
}

impl From<AggregateQuery> for MetricQuery {
    fn from(query: AggregateQuery) -> Self {
        MetricQuery::Aggregate(query)
    }
}

// =============================================================================
// Time Series Query
// =============================================================================

/// Query for `count` samples of a metric, starting at `start`, one sample
/// per resolution step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesQuery {
    pub path: String,
    pub context_prefix: String,
    pub metric_prefix: String,
    pub tag_prefix: Option<String>,
    pub start: i64,
    pub end: i64,
    pub count: usize,
    pub resolution: u32,
}

impl TimeSeriesQuery {
    /// Create a query at the default resolution. `end` is derived from
    /// `start` and `count`.
    pub fn new(
        path: impl Into<String>,
        context_prefix: impl Into<String>,
        metric_prefix: impl Into<String>,
        start: i64,
        count: usize,
    ) -> Self {
        let mut query = Self {
            path: path.into(),
            context_prefix: context_prefix.into(),
            metric_prefix: metric_prefix.into(),
            tag_prefix: None,
            start,
            end: start,
            count,
            resolution: DEFAULT_RESOLUTION,
        };
        query.end = query.last_timestamp();
        query
    }

    pub fn with_tag(mut self, tag_prefix: impl Into<String>) -> Self {
        self.tag_prefix = Some(tag_prefix.into());
        self
    }

    /// Change the resolution, keeping `start` and `count`.
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self.end = self.last_timestamp();
        self
    }

    fn last_timestamp(&self) -> i64 {
        let steps = i64::try_from(self.count.saturating_sub(1)).unwrap_or(i64::MAX);
        self.start
            .saturating_add(steps.saturating_mul(i64::from(self.resolution.max(1))))
    }
}

// =============================================================================
// Aggregate Query
// =============================================================================

/// Query for the running total of a metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateQuery {
    pub path: String,
    pub context_prefix: String,
    pub metric_prefix: String,
    pub tag_prefix: Option<String>,
    pub run_id: Option<String>,
}

impl AggregateQuery {
    pub fn new(
        path: impl Into<String>,
        context_prefix: impl Into<String>,
        metric_prefix: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            context_prefix: context_prefix.into(),
            metric_prefix: metric_prefix.into(),
            tag_prefix: None,
            run_id: None,
        }
    }

    pub fn with_tag(mut self, tag_prefix: impl Into<String>) -> Self {
        self.tag_prefix = Some(tag_prefix.into());
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_series_window() {
        let query = TimeSeriesQuery::new("/app/reads", "app", "tuples.read", 100, 10);
        assert_eq!(query.end, 109);
        assert_eq!(query.resolution, 1);

        let query = query.with_resolution(60);
        assert_eq!(query.end, 100 + 9 * 60);
    }

    #[test]
    fn test_empty_window() {
        let query = TimeSeriesQuery::new("/app/reads", "app", "tuples.read", 100, 0);
        assert_eq!(query.end, 100);
    }

    #[test]
    fn test_common_accessors() {
        let query: MetricQuery = AggregateQuery::new("/app/reads?aggregate=true", "app", "reads")
            .with_run_id("run-7")
            .into();

        assert_eq!(query.path(), "/app/reads?aggregate=true");
        assert_eq!(query.context_prefix(), "app");
        assert_eq!(query.metric_prefix(), "reads");
    }
}
