//! Aegis In-Memory Metrics Tables
//!
//! In-memory implementations of the time-series and aggregates tables, plus
//! a factory that hands out shared tables per scope and resolution.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::table::{AggregatesTable, MetricsTableFactory, TimeSeriesTable};
use crate::types::{
    tag_matches, AggregateValue, MetricsRecord, MetricsScanQuery, MetricsScanResult, TimeValue,
};
use aegis_common::{is_segment_prefix, AegisError, MetricsScope, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// =============================================================================
// Series Key
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct SeriesKey {
    context: String,
    metric: String,
    tag: Option<String>,
}

impl SeriesKey {
    fn new(context: &str, metric: &str, tag: Option<&str>) -> Self {
        Self {
            context: context.to_string(),
            metric: metric.to_string(),
            tag: tag.map(str::to_string),
        }
    }
}

/// Expand a record into its untagged total plus one entry per tag.
fn record_entries(record: &MetricsRecord) -> impl Iterator<Item = (Option<&str>, i64)> {
    std::iter::once((None, record.value)).chain(
        record
            .tags
            .iter()
            .map(|tag| (Some(tag.tag.as_str()), tag.value)),
    )
}

// =============================================================================
// Table Statistics
// =============================================================================

/// Counters for an in-memory table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStats {
    pub records_written: u64,
    pub scans_executed: u64,
    pub points_scanned: u64,
}

// =============================================================================
// In-Memory Time Series Table
// =============================================================================

/// Time-series table holding one bucketed series per context, metric and tag.
pub struct InMemoryTimeSeriesTable {
    scope: MetricsScope,
    resolution: u32,
    series: RwLock<BTreeMap<SeriesKey, BTreeMap<i64, i64>>>,
    stats: RwLock<TableStats>,
}

impl InMemoryTimeSeriesTable {
    /// Create an empty table. A zero resolution is treated as one second.
    pub fn new(scope: MetricsScope, resolution: u32) -> Self {
        Self {
            scope,
            resolution: resolution.max(1),
            series: RwLock::new(BTreeMap::new()),
            stats: RwLock::new(TableStats::default()),
        }
    }

    pub fn scope(&self) -> MetricsScope {
        self.scope
    }

    /// Number of stored series, tagged ones included.
    pub fn series_count(&self) -> usize {
        self.series.read().len()
    }

    pub fn stats(&self) -> TableStats {
        self.stats.read().clone()
    }

    /// Align a timestamp down to the start of its bucket.
    fn bucket(&self, timestamp: i64) -> i64 {
        timestamp.saturating_sub(timestamp.rem_euclid(i64::from(self.resolution)))
    }
}

impl TimeSeriesTable for InMemoryTimeSeriesTable {
    fn resolution(&self) -> u32 {
        self.resolution
    }

    fn scan(&self, query: &MetricsScanQuery) -> Result<Vec<MetricsScanResult>> {
        if query.start > query.end {
            return Ok(Vec::new());
        }

        let results: Vec<MetricsScanResult> = {
            let series = self.series.read();
            series
                .iter()
                .filter(|(key, _)| query.matches(&key.context, &key.metric, key.tag.as_deref()))
                .map(|(key, points)| MetricsScanResult {
                    context: key.context.clone(),
                    metric: key.metric.clone(),
                    tag: key.tag.clone(),
                    values: points
                        .range(query.start..=query.end)
                        .map(|(ts, value)| TimeValue::new(*ts, *value))
                        .collect(),
                })
                .filter(|result| !result.values.is_empty())
                .collect()
        };

        let mut stats = self.stats.write();
        stats.scans_executed += 1;
        stats.points_scanned += results.iter().map(|r| r.values.len() as u64).sum::<u64>();

        Ok(results)
    }

    fn save(&self, records: &[MetricsRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        {
            let mut series = self.series.write();
            for record in records {
                let bucket = self.bucket(record.timestamp);
                for (tag, value) in record_entries(record) {
                    let slot = series
                        .entry(SeriesKey::new(&record.context, &record.metric, tag))
                        .or_default()
                        .entry(bucket)
                        .or_insert(0);
                    *slot = slot.saturating_add(value);
                }
            }
        }

        self.stats.write().records_written += records.len() as u64;
        Ok(())
    }

    fn delete(&self, app_id: &str) -> Result<()> {
        let mut series = self.series.write();
        let before = series.len();
        series.retain(|key, _| !is_segment_prefix(&key.context, app_id));
        tracing::debug!(
            "Removed {} series of '{}' from {} time series table (resolution {})",
            before - series.len(),
            app_id,
            self.scope,
            self.resolution
        );
        Ok(())
    }
}

// =============================================================================
// In-Memory Aggregates Table
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct AggregateKey {
    series: SeriesKey,
    run_id: Option<String>,
}

/// Aggregates table holding one running total per context, metric, run and
/// tag.
pub struct InMemoryAggregatesTable {
    scope: MetricsScope,
    rows: RwLock<BTreeMap<AggregateKey, i64>>,
}

impl InMemoryAggregatesTable {
    pub fn new(scope: MetricsScope) -> Self {
        Self {
            scope,
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn scope(&self) -> MetricsScope {
        self.scope
    }

    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }
}

impl AggregatesTable for InMemoryAggregatesTable {
    fn scan(
        &self,
        context_prefix: &str,
        metric_prefix: &str,
        run_id: Option<&str>,
        tag_prefix: Option<&str>,
    ) -> Result<Vec<AggregateValue>> {
        let rows = self.rows.read();
        Ok(rows
            .iter()
            .filter(|(key, _)| {
                is_segment_prefix(&key.series.context, context_prefix)
                    && is_segment_prefix(&key.series.metric, metric_prefix)
                    && run_id.map_or(true, |run| key.run_id.as_deref() == Some(run))
                    && tag_matches(key.series.tag.as_deref(), tag_prefix)
            })
            .map(|(key, value)| AggregateValue {
                context: key.series.context.clone(),
                metric: key.series.metric.clone(),
                run_id: key.run_id.clone(),
                tag: key.series.tag.clone(),
                value: *value,
            })
            .collect())
    }

    fn update(&self, records: &[MetricsRecord]) -> Result<()> {
        let mut rows = self.rows.write();
        for record in records {
            for (tag, value) in record_entries(record) {
                let key = AggregateKey {
                    series: SeriesKey::new(&record.context, &record.metric, tag),
                    run_id: record.run_id.clone(),
                };
                let slot = rows.entry(key).or_insert(0);
                *slot = slot.saturating_add(value);
            }
        }
        Ok(())
    }

    fn delete(&self, app_id: &str) -> Result<()> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|key, _| !is_segment_prefix(&key.series.context, app_id));
        tracing::debug!(
            "Removed {} aggregate rows of '{}' from {} aggregates table",
            before - rows.len(),
            app_id,
            self.scope
        );
        Ok(())
    }
}

// =============================================================================
// In-Memory Table Factory
// =============================================================================

/// Factory whose tables live in process memory. Every call for the same scope
/// and resolution opens the same underlying table, the way named tables of a
/// real store would behave.
#[derive(Default)]
pub struct InMemoryTableFactory {
    time_series: Mutex<HashMap<(MetricsScope, u32), Arc<InMemoryTimeSeriesTable>>>,
    aggregates: Mutex<HashMap<MetricsScope, Arc<InMemoryAggregatesTable>>>,
    time_series_opened: AtomicUsize,
}

impl InMemoryTableFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `create_time_series` calls served so far.
    pub fn time_series_opened(&self) -> usize {
        self.time_series_opened.load(Ordering::SeqCst)
    }

    /// Direct access to a table opened earlier, for inspection.
    pub fn time_series_table(
        &self,
        scope: MetricsScope,
        resolution: u32,
    ) -> Option<Arc<InMemoryTimeSeriesTable>> {
        self.time_series.lock().get(&(scope, resolution)).cloned()
    }
}

impl MetricsTableFactory for InMemoryTableFactory {
    fn create_time_series(
        &self,
        scope: MetricsScope,
        resolution: u32,
    ) -> Result<Arc<dyn TimeSeriesTable>> {
        if resolution == 0 {
            return Err(AegisError::TableCreation {
                table: format!("{}.timeseries.0", scope),
                reason: "resolution must be positive".to_string(),
            });
        }

        self.time_series_opened.fetch_add(1, Ordering::SeqCst);
        let table = self
            .time_series
            .lock()
            .entry((scope, resolution))
            .or_insert_with(|| Arc::new(InMemoryTimeSeriesTable::new(scope, resolution)))
            .clone();

        Ok(table)
    }

    fn create_aggregates(&self, scope: MetricsScope) -> Result<Arc<dyn AggregatesTable>> {
        let table = self
            .aggregates
            .lock()
            .entry(scope)
            .or_insert_with(|| Arc::new(InMemoryAggregatesTable::new(scope)))
            .clone();

        Ok(table)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(table: &dyn TimeSeriesTable, context: &str, metric: &str) -> Vec<MetricsScanResult> {
        let query = MetricsScanQuery::builder()
            .context(context)
            .metric(metric)
            .build(i64::MIN, i64::MAX);
        table.scan(&query).expect("scan should succeed")
    }

    #[test]
    fn test_save_and_scan() {
        let table = InMemoryTimeSeriesTable::new(MetricsScope::Reactor, 1);
        table
            .save(&[
                MetricsRecord::new("app.f.a", "tuples.read", 12, 4),
                MetricsRecord::new("app.f.a", "tuples.read", 10, 1),
                MetricsRecord::new("app.f.a", "tuples.read", 12, 2),
            ])
            .expect("save should succeed");

        let results = scan_all(&table, "app", "tuples.read");
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].values,
            vec![TimeValue::new(10, 1), TimeValue::new(12, 6)]
        );
        assert_eq!(table.stats().records_written, 3);
    }

    #[test]
    fn test_bucket_at_lower_timestamp_bound() {
        let table = InMemoryTimeSeriesTable::new(MetricsScope::Reactor, 60);
        table
            .save(&[MetricsRecord::new("app", "events", i64::MIN, 5)])
            .expect("save should succeed");

        let results = scan_all(&table, "app", "events");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].values, vec![TimeValue::new(i64::MIN, 5)]);
    }

    #[test]
    fn test_scan_time_range() {
        let table = InMemoryTimeSeriesTable::new(MetricsScope::Reactor, 1);
        let records: Vec<_> = (0..10)
            .map(|ts| MetricsRecord::new("app", "events", ts, ts))
            .collect();
        table.save(&records).expect("save should succeed");

        let query = MetricsScanQuery::builder().context("app").metric("events").build(3, 5);
        let results = table.scan(&query).expect("scan should succeed");
        let stamps: Vec<i64> = results[0].values.iter().map(|tv| tv.timestamp).collect();
        assert_eq!(stamps, vec![3, 4, 5]);

        let inverted = MetricsScanQuery::builder().context("app").build(5, 3);
        assert!(table.scan(&inverted).expect("scan should succeed").is_empty());
    }

    #[test]
    fn test_bucketing() {
        let table = InMemoryTimeSeriesTable::new(MetricsScope::Reactor, 60);
        table
            .save(&[
                MetricsRecord::new("app", "events", 61, 1),
                MetricsRecord::new("app", "events", 119, 2),
                MetricsRecord::new("app", "events", 120, 5),
            ])
            .expect("save should succeed");

        let results = scan_all(&table, "app", "events");
        assert_eq!(
            results[0].values,
            vec![TimeValue::new(60, 3), TimeValue::new(120, 5)]
        );
    }

    #[test]
    fn test_tagged_series() {
        let table = InMemoryTimeSeriesTable::new(MetricsScope::Reactor, 1);
        table
            .save(&[MetricsRecord::new("app", "events", 1, 5)
                .with_tag("input.a", 2)
                .with_tag("input.b", 3)])
            .expect("save should succeed");

        assert_eq!(table.series_count(), 3);

        let untagged = scan_all(&table, "app", "events");
        assert_eq!(untagged.len(), 1);
        assert_eq!(untagged[0].values[0].value, 5);

        let query = MetricsScanQuery::builder()
            .context("app")
            .metric("events")
            .tag(Some("input".to_string()))
            .build(0, 10);
        let tagged = table.scan(&query).expect("scan should succeed");
        assert_eq!(tagged.len(), 2);
    }

    #[test]
    fn test_delete_application() {
        let table = InMemoryTimeSeriesTable::new(MetricsScope::Reactor, 1);
        table
            .save(&[
                MetricsRecord::new("WordCount.f.counter", "events", 1, 1),
                MetricsRecord::new("WordCounter.f.counter", "events", 1, 1),
            ])
            .expect("save should succeed");

        table.delete("WordCount").expect("delete should succeed");

        assert!(scan_all(&table, "WordCount", "").is_empty());
        assert_eq!(scan_all(&table, "WordCounter", "").len(), 1);
    }

    #[test]
    fn test_aggregates_scan_filters() {
        let table = InMemoryAggregatesTable::new(MetricsScope::Reactor);
        table
            .update(&[
                MetricsRecord::new("app.f.a", "tuples.read", 1, 3).with_run_id("run-1"),
                MetricsRecord::new("app.f.a", "tuples.read", 2, 4).with_run_id("run-2"),
                MetricsRecord::new("app.f.b", "tuples.read", 3, 5)
                    .with_run_id("run-1")
                    .with_tag("queue", 5),
            ])
            .expect("update should succeed");

        let all = table
            .scan("app", "tuples.read", None, None)
            .expect("scan should succeed");
        assert_eq!(all.iter().map(|v| v.value).sum::<i64>(), 12);

        let run1 = table
            .scan("app", "tuples", Some("run-1"), None)
            .expect("scan should succeed");
        assert_eq!(run1.iter().map(|v| v.value).sum::<i64>(), 8);

        let tagged = table
            .scan("app", "tuples", None, Some("qu"))
            .expect("scan should succeed");
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].tag.as_deref(), Some("queue"));
    }

    #[test]
    fn test_aggregates_delete() {
        let table = InMemoryAggregatesTable::new(MetricsScope::Reactor);
        table
            .update(&[
                MetricsRecord::new("app", "events", 1, 1),
                MetricsRecord::new("other", "events", 1, 1),
            ])
            .expect("update should succeed");

        table.delete("app").expect("delete should succeed");

        assert_eq!(table.row_count(), 1);
        assert!(table
            .scan("app", "", None, None)
            .expect("scan should succeed")
            .is_empty());
    }

    #[test]
    fn test_factory_shares_tables() {
        let factory = InMemoryTableFactory::new();
        let first = factory
            .create_time_series(MetricsScope::Reactor, 1)
            .expect("create should succeed");
        first
            .save(&[MetricsRecord::new("app", "events", 1, 1)])
            .expect("save should succeed");

        let second = factory
            .create_time_series(MetricsScope::Reactor, 1)
            .expect("create should succeed");
        assert_eq!(scan_all(second.as_ref(), "app", "events").len(), 1);

        let other_scope = factory
            .create_time_series(MetricsScope::User, 1)
            .expect("create should succeed");
        assert!(scan_all(other_scope.as_ref(), "app", "events").is_empty());

        assert_eq!(factory.time_series_opened(), 3);
    }

    #[test]
    fn test_factory_rejects_zero_resolution() {
        let factory = InMemoryTableFactory::new();
        let result = factory.create_time_series(MetricsScope::Reactor, 0);
        assert!(matches!(result, Err(AegisError::TableCreation { .. })));
        assert_eq!(factory.time_series_opened(), 0);
    }
}
