//! Aegis Batch Metrics Processor
//!
//! Runs a decoded batch of metric queries against the metrics tables and
//! assembles one result per query, in input order. Also owns the write and
//! delete paths that touch both table kinds.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::cache::TableCache;
use crate::derived::DerivedMetric;
use crate::request::{AggregateQuery, MetricQuery, TimeSeriesQuery};
use crate::response::{AggregateResponse, BatchEntry, MetricsResult, TimeSeriesResponse};
use aegis_common::{AegisError, MetricsConfig, Result};
use aegis_timeseries::{
    AggregatesTable, MetricsRecord, MetricsScanQuery, MetricsTableFactory, SeriesMerger,
    SumAggregator, TimeSeriesTable, TimeValue,
};
use std::sync::Arc;

// =============================================================================
// Batch Metrics Processor
// =============================================================================

/// Batch query engine over one scope of metrics tables.
///
/// Time-series tables are opened lazily per resolution through a
/// [`TableCache`]; the aggregates table is opened once at construction.
pub struct BatchMetricsProcessor {
    config: MetricsConfig,
    derived: DerivedMetric,
    tables: TableCache,
    aggregates: Arc<dyn AggregatesTable>,
}

impl BatchMetricsProcessor {
    /// Create a processor, validating the configuration and opening the
    /// aggregates table.
    pub fn new(factory: Arc<dyn MetricsTableFactory>, config: MetricsConfig) -> Result<Self> {
        config.validate()?;
        let aggregates = factory.create_aggregates(config.scope)?;

        Ok(Self {
            derived: DerivedMetric::from(&config.derived),
            tables: TableCache::new(factory, config.scope),
            aggregates,
            config,
        })
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    pub fn tables(&self) -> &TableCache {
        &self.tables
    }

    // -------------------------------------------------------------------------
    // Batch Processing
    // -------------------------------------------------------------------------

    /// Process a batch, returning one entry per query in input order.
    ///
    /// With failure isolation enabled a failing query yields an entry with
    /// its error and the batch carries on. Otherwise the first failure aborts
    /// the batch and is returned.
    pub fn process(&self, queries: &[MetricQuery]) -> Result<Vec<BatchEntry>> {
        let mut entries = Vec::with_capacity(queries.len());
        let mut failures = 0usize;

        for query in queries {
            tracing::debug!("Processing metrics query {}", query.path());

            match self.execute(query) {
                Ok(result) => entries.push(BatchEntry::success(query.path(), result)),
                Err(e) if self.config.isolate_failures => {
                    tracing::warn!("Metrics query {} failed: {}", query.path(), e);
                    failures += 1;
                    entries.push(BatchEntry::failure(query.path(), e));
                }
                Err(e) => {
                    tracing::error!("Metrics query {} failed, aborting batch: {}", query.path(), e);
                    return Err(e.for_query(query.path()));
                }
            }
        }

        tracing::info!(
            "Processed metrics batch of {} queries ({} failed)",
            queries.len(),
            failures
        );
        Ok(entries)
    }

    /// Run a single query.
    pub fn execute(&self, query: &MetricQuery) -> Result<MetricsResult> {
        match query {
            MetricQuery::Aggregate(query) => self.query_aggregate(query).map(Into::into),
            MetricQuery::TimeSeries(query) if self.derived.is_requested(&query.metric_prefix) => {
                self.query_derived(query).map(Into::into)
            }
            MetricQuery::TimeSeries(query) => self.query_time_series(query).map(Into::into),
        }
    }

    fn query_time_series(&self, query: &TimeSeriesQuery) -> Result<TimeSeriesResponse> {
        let table = self.table_for(query)?;
        let scan = MetricsScanQuery::builder()
            .context(query.context_prefix.as_str())
            .metric(query.metric_prefix.as_str())
            .tag(query.tag_prefix.clone())
            .build(query.start, query.end);

        let data = Self::scan_dense(table.as_ref(), &scan, query)?;
        Ok(TimeSeriesResponse::new(query.start, query.end, data))
    }

    fn query_derived(&self, query: &TimeSeriesQuery) -> Result<TimeSeriesResponse> {
        let table = self.table_for(query)?;
        let scan_metric = |metric: &str| {
            MetricsScanQuery::builder()
                .context(query.context_prefix.as_str())
                .metric(metric)
                .build(query.start, query.end)
        };

        let numerator =
            Self::scan_dense(table.as_ref(), &scan_metric(self.derived.numerator()), query)?;
        let denominator =
            Self::scan_dense(table.as_ref(), &scan_metric(self.derived.denominator()), query)?;

        let data = self.derived.combine(&numerator, &denominator);
        Ok(TimeSeriesResponse::new(query.start, query.end, data))
    }

    fn query_aggregate(&self, query: &AggregateQuery) -> Result<AggregateResponse> {
        let rows = self.aggregates.scan(
            &query.context_prefix,
            &query.metric_prefix,
            query.run_id.as_deref(),
            query.tag_prefix.as_deref(),
        )?;

        Ok(AggregateResponse::new(SumAggregator::sum(
            rows.into_iter().map(|row| row.value),
        )))
    }

    fn table_for(&self, query: &TimeSeriesQuery) -> Result<Arc<dyn TimeSeriesTable>> {
        if !self.config.supports_resolution(query.resolution) {
            return Err(AegisError::UnsupportedResolution(query.resolution));
        }
        self.tables.get(query.resolution)
    }

    /// Scan and merge every matching series into one dense series covering
    /// the query window.
    fn scan_dense(
        table: &dyn TimeSeriesTable,
        scan: &MetricsScanQuery,
        query: &TimeSeriesQuery,
    ) -> Result<Vec<TimeValue>> {
        let results = table.scan(scan)?;
        Ok(SeriesMerger::new(query.start, query.count)
            .with_step(i64::from(query.resolution))
            .merge(results))
    }

    // -------------------------------------------------------------------------
    // Ingestion
    // -------------------------------------------------------------------------

    /// Write records into every configured time-series resolution and into
    /// the aggregates table.
    pub fn record(&self, records: &[MetricsRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        for resolution in self.config.ordered_resolutions() {
            self.tables.get(resolution)?.save(records)?;
        }
        self.aggregates.update(records)?;

        tracing::debug!("Recorded {} metrics records", records.len());
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Deletion
    // -------------------------------------------------------------------------

    /// Delete all metrics of an application, time-series tables first (the
    /// default resolution before the others), then the aggregates table.
    ///
    /// Not transactional: when a later step fails, the earlier deletions
    /// stay in effect.
    pub fn delete_application(&self, app_id: &str) -> Result<()> {
        if app_id.is_empty() {
            return Err(AegisError::InvalidQuery(
                "application id must not be empty".to_string(),
            ));
        }

        tracing::debug!("Deleting metrics of application {}", app_id);

        for resolution in self.config.ordered_resolutions() {
            let store = format!("time series table (resolution {})", resolution);
            self.tables
                .get(resolution)
                .and_then(|table| table.delete(app_id))
                .map_err(|e| deletion_error(&store, app_id, e))?;
        }

        self.aggregates
            .delete(app_id)
            .map_err(|e| deletion_error("aggregates table", app_id, e))?;

        tracing::info!("Deleted metrics of application {}", app_id);
        Ok(())
    }
}

fn deletion_error(store: &str, app_id: &str, error: AegisError) -> AegisError {
    tracing::error!("Failed to delete metrics of {} from {}: {}", app_id, store, error);
    AegisError::Deletion {
        store: store.to_string(),
        app_id: app_id.to_string(),
        reason: error.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
