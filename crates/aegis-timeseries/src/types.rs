//! Aegis Time Series Types
//!
//! Core data types for metrics ingestion and table scans.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use aegis_common::is_segment_prefix;
use serde::{Deserialize, Serialize};

// =============================================================================
// Time Value
// =============================================================================

/// A single sample of a series: an integer timestamp and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeValue {
    #[serde(rename = "time")]
    pub timestamp: i64,
    pub value: i64,
}

impl TimeValue {
    pub fn new(timestamp: i64, value: i64) -> Self {
        Self { timestamp, value }
    }
}

// =============================================================================
// Metrics Record
// =============================================================================

/// Per-tag breakdown of a record's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagValue {
    pub tag: String,
    pub value: i64,
}

impl TagValue {
    pub fn new(tag: impl Into<String>, value: i64) -> Self {
        Self {
            tag: tag.into(),
            value,
        }
    }
}

/// A single emitted metric value for ingestion.
///
/// `value` is the untagged total; each entry of `tags` is stored as its own
/// tagged series next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub context: String,
    pub metric: String,
    #[serde(default)]
    pub run_id: Option<String>,
    pub timestamp: i64,
    pub value: i64,
    #[serde(default)]
    pub tags: Vec<TagValue>,
}

impl MetricsRecord {
    pub fn new(
        context: impl Into<String>,
        metric: impl Into<String>,
        timestamp: i64,
        value: i64,
    ) -> Self {
        Self {
            context: context.into(),
            metric: metric.into(),
            run_id: None,
            timestamp,
            value,
            tags: Vec::new(),
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>, value: i64) -> Self {
        self.tags.push(TagValue::new(tag, value));
        self
    }
}

// =============================================================================
// Scan Query
// =============================================================================

/// Filter for a time-series table scan over `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsScanQuery {
    pub context_prefix: String,
    pub metric_prefix: String,
    /// `None` selects untagged series only.
    pub tag_prefix: Option<String>,
    pub start: i64,
    pub end: i64,
}

impl MetricsScanQuery {
    pub fn builder() -> MetricsScanQueryBuilder {
        MetricsScanQueryBuilder::default()
    }

    /// Check whether a stored series identity passes this filter.
    pub fn matches(&self, context: &str, metric: &str, tag: Option<&str>) -> bool {
        is_segment_prefix(context, &self.context_prefix)
            && is_segment_prefix(metric, &self.metric_prefix)
            && tag_matches(tag, self.tag_prefix.as_deref())
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

/// Builder for [`MetricsScanQuery`].
#[derive(Debug, Clone, Default)]
pub struct MetricsScanQueryBuilder {
    context_prefix: String,
    metric_prefix: String,
    tag_prefix: Option<String>,
}

impl MetricsScanQueryBuilder {
    pub fn context(mut self, context_prefix: impl Into<String>) -> Self {
        self.context_prefix = context_prefix.into();
        self
    }

    pub fn metric(mut self, metric_prefix: impl Into<String>) -> Self {
        self.metric_prefix = metric_prefix.into();
        self
    }

    pub fn tag(mut self, tag_prefix: Option<String>) -> Self {
        self.tag_prefix = tag_prefix;
        self
    }

    pub fn build(self, start: i64, end: i64) -> MetricsScanQuery {
        MetricsScanQuery {
            context_prefix: self.context_prefix,
            metric_prefix: self.metric_prefix,
            tag_prefix: self.tag_prefix,
            start,
            end,
        }
    }
}

/// Untagged filters match untagged entries; tag filters are plain string
/// prefixes.
pub(crate) fn tag_matches(tag: Option<&str>, filter: Option<&str>) -> bool {
    match (tag, filter) {
        (None, None) => true,
        (Some(tag), Some(prefix)) => tag.starts_with(prefix),
        _ => false,
    }
}

// =============================================================================
// Scan Results
// =============================================================================

/// One stored series returned by a time-series scan, with its samples in
/// ascending timestamp order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsScanResult {
    pub context: String,
    pub metric: String,
    pub tag: Option<String>,
    pub values: Vec<TimeValue>,
}

impl IntoIterator for MetricsScanResult {
    type Item = TimeValue;
    type IntoIter = std::vec::IntoIter<TimeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// One row of an aggregates table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateValue {
    pub context: String,
    pub metric: String,
    pub run_id: Option<String>,
    pub tag: Option<String>,
    pub value: i64,
}

// =============================================================================
// Tests
// =============================================================================
