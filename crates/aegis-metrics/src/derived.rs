//! Aegis Derived Metrics
//!
//! Metrics that are not stored but computed from two stored series over the
//! same window.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use aegis_common::DerivedMetricConfig;
use aegis_timeseries::TimeValue;

// =============================================================================
// Derived Metric
// =============================================================================

/// Ratio metric: `numerator / denominator * 100` per sample, e.g. busyness
/// as tuples read per event processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedMetric {
    name: String,
    numerator: String,
    denominator: String,
}

impl DerivedMetric {
    pub fn new(
        name: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            numerator: numerator.into(),
            denominator: denominator.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn numerator(&self) -> &str {
        &self.numerator
    }

    pub fn denominator(&self) -> &str {
        &self.denominator
    }

    /// Whether a query's metric asks for this derived metric.
    pub fn is_requested(&self, metric: &str) -> bool {
        self.name == metric
    }

    /// Combine two dense series sampled at the same timestamps.
    ///
    /// Both inputs must come from the same window; the output has one sample
    /// per numerator sample and takes its timestamps from the numerator.
    pub fn combine(&self, numerator: &[TimeValue], denominator: &[TimeValue]) -> Vec<TimeValue> {
        debug_assert_eq!(numerator.len(), denominator.len());
        numerator
            .iter()
            .zip(denominator.iter().map(|tv| tv.value).chain(std::iter::repeat(0)))
            .map(|(num, den)| TimeValue::new(num.timestamp, ratio_percent(num.value, den)))
            .collect()
    }
}

impl From<&DerivedMetricConfig> for DerivedMetric {
    fn from(config: &DerivedMetricConfig) -> Self {
        Self::new(&config.name, &config.numerator, &config.denominator)
    }
}

/// `numerator / denominator * 100`, truncated toward zero. Zero when the
/// denominator is zero. Not clamped: a numerator larger than the denominator
/// yields more than 100.
pub fn ratio_percent(numerator: i64, denominator: i64) -> i64 {
    if denominator == 0 {
        return 0;
    }
    (numerator as f64 / denominator as f64 * 100.0) as i64
}

// =============================================================================
// Tests
// =============================================================================
