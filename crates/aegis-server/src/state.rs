//! Aegis Server State
//!
//! Application state shared across all request handlers: the server
//! configuration, the batch metrics processor, and the request parser.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::config::ServerConfig;
use crate::request::{PathRequestParser, RequestParser};
use aegis_common::Result;
use aegis_metrics::BatchMetricsProcessor;
use aegis_timeseries::{InMemoryTableFactory, MetricsTableFactory};
use std::sync::Arc;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub processor: Arc<BatchMetricsProcessor>,
    pub parser: Arc<dyn RequestParser>,
}

impl AppState {
    /// Create application state backed by in-memory metrics tables.
    pub fn new(config: ServerConfig) -> Result<Self> {
        Self::with_factory(config, Arc::new(InMemoryTableFactory::new()))
    }

    /// Create application state over the given table factory.
    pub fn with_factory(
        config: ServerConfig,
        factory: Arc<dyn MetricsTableFactory>,
    ) -> Result<Self> {
        let processor = BatchMetricsProcessor::new(factory, config.metrics.clone())?;
        let parser = PathRequestParser::new(config.max_samples_per_query);

        Ok(Self {
            config: Arc::new(config),
            processor: Arc::new(processor),
            parser: Arc::new(parser),
        })
    }

    /// Replace the request parser.
    pub fn with_parser(mut self, parser: Arc<dyn RequestParser>) -> Self {
        self.parser = parser;
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
