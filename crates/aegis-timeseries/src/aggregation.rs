//! Aegis Time Series Aggregation
//!
//! Merging of sparse, sorted series into dense gap-filled series, and sum
//! reduction of aggregate scans.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::types::TimeValue;
use std::iter::Peekable;

// =============================================================================
// Time Value Cursor
// =============================================================================

/// Forward-only cursor over a time-sorted sequence that can look at the next
/// timestamp without consuming it.
pub struct TimeValueCursor<I: Iterator<Item = TimeValue>> {
    inner: Peekable<I>,
}

impl<I: Iterator<Item = TimeValue>> TimeValueCursor<I> {
    pub fn new(values: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            inner: values.into_iter().peekable(),
        }
    }

    /// Timestamp of the next element, if any.
    pub fn peek_timestamp(&mut self) -> Option<i64> {
        self.inner.peek().map(|tv| tv.timestamp)
    }

    /// Take the next element.
    pub fn consume(&mut self) -> Option<TimeValue> {
        self.inner.next()
    }

    /// Drop every element stamped before `timestamp`.
    pub fn skip_before(&mut self, timestamp: i64) {
        while matches!(self.peek_timestamp(), Some(ts) if ts < timestamp) {
            self.inner.next();
        }
    }

    /// Consume the next element if it is stamped exactly `timestamp`.
    pub fn take_at(&mut self, timestamp: i64) -> Option<i64> {
        self.skip_before(timestamp);
        if self.peek_timestamp() == Some(timestamp) {
            self.consume().map(|tv| tv.value)
        } else {
            None
        }
    }
}

// =============================================================================
// Series Merger
// =============================================================================

/// Produces a dense series of `count` samples starting at `start`, `step`
/// apart, from any number of sparse sorted sequences.
///
/// Values of different sequences landing on the same timestamp are summed;
/// timestamps no sequence covers are filled with zero. Every input is read
/// once, front to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesMerger {
    start: i64,
    count: usize,
    step: i64,
}

impl SeriesMerger {
    pub fn new(start: i64, count: usize) -> Self {
        Self {
            start,
            count,
            step: 1,
        }
    }

    /// Space samples `step` apart. Non-positive steps are treated as one.
    pub fn with_step(mut self, step: i64) -> Self {
        self.step = step.max(1);
        self
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Timestamp of the sample at `offset`.
    pub fn timestamp_at(&self, offset: usize) -> i64 {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        self.start.saturating_add(offset.saturating_mul(self.step))
    }

    /// Timestamp of the last sample, or `start` for an empty window.
    pub fn end(&self) -> i64 {
        self.timestamp_at(self.count.saturating_sub(1))
    }

    /// Merge the sequences into one dense series.
    pub fn merge<S>(&self, sources: impl IntoIterator<Item = S>) -> Vec<TimeValue>
    where
        S: IntoIterator<Item = TimeValue>,
    {
        let mut cursors: Vec<TimeValueCursor<S::IntoIter>> =
            sources.into_iter().map(|source| TimeValueCursor::new(source)).collect();

        (0..self.count)
            .map(|offset| {
                let timestamp = self.timestamp_at(offset);
                let value = cursors
                    .iter_mut()
                    .filter_map(|cursor| cursor.take_at(timestamp))
                    .fold(0i64, i64::saturating_add);
                TimeValue::new(timestamp, value)
            })
            .collect()
    }
}

// =============================================================================
// Sum Aggregator
// =============================================================================

/// Streaming sum with a 64-bit saturating accumulator.
#[derive(Debug, Clone, Default)]
pub struct SumAggregator {
    sum: i64,
    count: usize,
}

impl SumAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value to the sum.
    pub fn add(&mut self, value: i64) {
        self.sum = self.sum.saturating_add(value);
        self.count += 1;
    }

    /// Current sum; zero when nothing was added.
    pub fn value(&self) -> i64 {
        self.sum
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Sum a whole sequence.
    pub fn sum(values: impl IntoIterator<Item = i64>) -> i64 {
        let mut aggregator = Self::new();
        for value in values {
            aggregator.add(value);
        }
        aggregator.value()
    }
}

// =============================================================================
// Tests
// =============================================================================
