//! Aegis Request Parsing
//!
//! Turns the request URIs of a batch body into metric queries. A request
//! has the form `/<context segments>/<metric>?<params>`; every path segment
//! but the last is joined with `.` into the context prefix and the last
//! segment is the metric prefix.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use aegis_common::{AegisError, Result, DEFAULT_RESOLUTION};
use aegis_metrics::{AggregateQuery, MetricQuery, TimeSeriesQuery};
use axum::extract::Query;
use axum::http::Uri;
use serde::Deserialize;

/// Default upper bound on the samples of one time series request.
pub const DEFAULT_MAX_COUNT: usize = 86_400;

// =============================================================================
// Request Parser
// =============================================================================

/// Decodes one request URI of a batch.
pub trait RequestParser: Send + Sync {
    fn parse(&self, uri: &str) -> Result<MetricQuery>;
}

/// Query string parameters of a request.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct RequestParams {
    aggregate: bool,
    tag: Option<String>,
    run_id: Option<String>,
    resolution: Option<u32>,
    start: Option<i64>,
    end: Option<i64>,
    count: Option<usize>,
}

impl RequestParams {
    fn has_window(&self) -> bool {
        self.start.is_some() || self.end.is_some() || self.count.is_some()
    }
}

/// Parser for the path-and-query request format.
#[derive(Debug, Clone)]
pub struct PathRequestParser {
    max_count: usize,
}

impl Default for PathRequestParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COUNT)
    }
}

impl PathRequestParser {
    pub fn new(max_count: usize) -> Self {
        Self { max_count }
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Parse a request, resolving a count-only window against `now`.
    pub fn parse_at(&self, request: &str, now: i64) -> Result<MetricQuery> {
        let uri: Uri = request
            .parse()
            .map_err(|e| AegisError::Parse(format!("{}: {}", request, e)))?;

        let mut segments: Vec<&str> = uri.path().split('/').filter(|s| !s.is_empty()).collect();
        let metric = segments
            .pop()
            .ok_or_else(|| AegisError::InvalidQuery(format!("{}: missing metric", request)))?;
        let context = segments.join(".");

        let params = match uri.query() {
            Some(_) => {
                Query::<RequestParams>::try_from_uri(&uri)
                    .map_err(|e| AegisError::Parse(format!("{}: {}", request, e.body_text())))?
                    .0
            }
            None => RequestParams::default(),
        };

        if params.aggregate {
            if params.has_window() || params.resolution.is_some() {
                return Err(AegisError::InvalidQuery(format!(
                    "{}: aggregate requests take no time window",
                    request
                )));
            }

            let mut query = AggregateQuery::new(request, context, metric);
            query.tag_prefix = params.tag;
            query.run_id = params.run_id;
            return Ok(query.into());
        }

        if params.run_id.is_some() {
            return Err(AegisError::InvalidQuery(format!(
                "{}: runId is only supported for aggregate requests",
                request
            )));
        }

        let resolution = params.resolution.unwrap_or(DEFAULT_RESOLUTION);
        if resolution == 0 {
            return Err(AegisError::InvalidQuery(format!(
                "{}: resolution must be positive",
                request
            )));
        }

        let (start, count) = self.resolve_window(request, &params, resolution, now)?;
        let mut query = TimeSeriesQuery::new(request, context, metric, start, count)
            .with_resolution(resolution);
        query.tag_prefix = params.tag;
        Ok(query.into())
    }

    /// Resolve any two of start, end and count into start and count.
    fn resolve_window(
        &self,
        request: &str,
        params: &RequestParams,
        resolution: u32,
        now: i64,
    ) -> Result<(i64, usize)> {
        let step = i64::from(resolution);
        let invalid = |reason: &str| AegisError::InvalidQuery(format!("{}: {}", request, reason));

        let (start, count) = match (params.start, params.end, params.count) {
            (Some(_), Some(_), Some(_)) => {
                return Err(invalid("at most two of start, end and count may be given"))
            }
            (Some(start), Some(end), None) => {
                if end < start {
                    return Err(invalid("end must not be before start"));
                }
                let (start, end) = (align_down(start, step), align_down(end, step));
                let steps = end
                    .checked_sub(start)
                    .ok_or_else(|| invalid("time window too large"))?
                    / step;
                let count = usize::try_from(steps)
                    .ok()
                    .and_then(|steps| steps.checked_add(1))
                    .ok_or_else(|| invalid("time window too large"))?;
                (start, count)
            }
            (Some(start), None, Some(count)) => (align_down(start, step), count),
            (None, Some(end), Some(count)) => {
                (window_start(align_down(end, step), count, step), count)
            }
            (None, None, Some(count)) => {
                (window_start(align_down(now, step), count, step), count)
            }
            _ => return Err(invalid("time window requires two of start, end and count")),
        };

        if count == 0 {
            return Err(invalid("count must be positive"));
        }
        if count > self.max_count {
            return Err(invalid(&format!(
                "count {} exceeds the limit of {}",
                count, self.max_count
            )));
        }
        Ok((start, count))
    }
}

/// Align a timestamp down to the start of its resolution bucket, matching
/// how the tables bucket writes.
fn align_down(timestamp: i64, step: i64) -> i64 {
    timestamp.saturating_sub(timestamp.rem_euclid(step))
}

fn window_start(end: i64, count: usize, step: i64) -> i64 {
    let steps = i64::try_from(count.saturating_sub(1)).unwrap_or(i64::MAX);
    end.saturating_sub(steps.saturating_mul(step))
}

impl RequestParser for PathRequestParser {
    fn parse(&self, uri: &str) -> Result<MetricQuery> {
        self.parse_at(uri, chrono::Utc::now().timestamp())
    }
}

// =============================================================================
// Batch Decoding
// =============================================================================

/// Decode a batch body: a JSON array of request URIs. The first request
/// that fails to parse rejects the whole batch.
pub fn decode_batch(body: &[u8], parser: &dyn RequestParser) -> Result<Vec<MetricQuery>> {
    let requests: Vec<String> =
        serde_json::from_slice(body).map_err(|e| AegisError::Parse(e.to_string()))?;

    requests.iter().map(|request| parser.parse(request)).collect()
}

// =============================================================================
// Tests
// =============================================================================
