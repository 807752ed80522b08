//! Aegis Table Cache
//!
//! Process-lifetime cache of time-series table handles keyed by resolution.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use aegis_common::{MetricsScope, Result};
use aegis_timeseries::{MetricsTableFactory, TimeSeriesTable};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Table handle of one resolution. `init` serializes creation so the
/// handle itself is only write-locked for the store.
#[derive(Default)]
struct Slot {
    table: RwLock<Option<Arc<dyn TimeSeriesTable>>>,
    init: Mutex<()>,
}

impl Slot {
    fn cached(&self) -> Option<Arc<dyn TimeSeriesTable>> {
        self.table.read().as_ref().map(Arc::clone)
    }
}

// =============================================================================
// Table Cache
// =============================================================================

/// Lazily opens one time-series table per resolution and hands the same
/// handle to every later caller.
///
/// Each resolution owns a slot. Callers racing on an empty slot serialize on
/// the slot's creation lock, so the factory is asked at most once per
/// resolution while other resolutions stay unaffected. Readers of an open
/// handle never wait on a creation in progress. A failed creation leaves the
/// slot empty and the next caller tries again. Entries are never evicted.
pub struct TableCache {
    factory: Arc<dyn MetricsTableFactory>,
    scope: MetricsScope,
    slots: RwLock<HashMap<u32, Arc<Slot>>>,
}

impl TableCache {
    pub fn new(factory: Arc<dyn MetricsTableFactory>, scope: MetricsScope) -> Self {
        Self {
            factory,
            scope,
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> MetricsScope {
        self.scope
    }

    /// Get the table for `resolution`, opening it on first use.
    pub fn get(&self, resolution: u32) -> Result<Arc<dyn TimeSeriesTable>> {
        let slot = self.slot(resolution);
        if let Some(table) = slot.cached() {
            return Ok(table);
        }

        let _creating = slot.init.lock();
        if let Some(table) = slot.cached() {
            return Ok(table);
        }

        tracing::debug!(
            "Opening {} time series table for resolution {}",
            self.scope,
            resolution
        );
        let table = self.factory.create_time_series(self.scope, resolution)?;
        *slot.table.write() = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Resolutions with an open table, ascending. Resolutions still being
    /// opened are not included.
    pub fn cached_resolutions(&self) -> Vec<u32> {
        let slots: Vec<(u32, Arc<Slot>)> = self
            .slots
            .read()
            .iter()
            .map(|(resolution, slot)| (*resolution, Arc::clone(slot)))
            .collect();

        let mut resolutions: Vec<u32> = slots
            .into_iter()
            .filter(|(_, slot)| slot.table.read().is_some())
            .map(|(resolution, _)| resolution)
            .collect();
        resolutions.sort_unstable();
        resolutions
    }

    pub fn len(&self) -> usize {
        self.cached_resolutions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, resolution: u32) -> Arc<Slot> {
        if let Some(slot) = self.slots.read().get(&resolution) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(slots.entry(resolution).or_default())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_common::AegisError;
    use aegis_timeseries::{AggregatesTable, InMemoryAggregatesTable, InMemoryTimeSeriesTable};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::Barrier;
    use std::time::Duration;

    /// Factory that opens a fresh table per call, slowly, and counts calls.
    #[derive(Default)]
    struct CountingFactory {
        created: AtomicUsize,
        failures_left: AtomicUsize,
    }

    impl MetricsTableFactory for CountingFactory {
        fn create_time_series(
            &self,
            scope: MetricsScope,
            resolution: u32,
        ) -> Result<Arc<dyn TimeSeriesTable>> {
            std::thread::sleep(Duration::from_millis(20));
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(AegisError::TableCreation {
                    table: "timeseries".into(),
                    reason: "store unavailable".into(),
                });
            }
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(InMemoryTimeSeriesTable::new(scope, resolution)))
        }

        fn create_aggregates(&self, scope: MetricsScope) -> Result<Arc<dyn AggregatesTable>> {
            Ok(Arc::new(InMemoryAggregatesTable::new(scope)))
        }
    }

    #[test]
    fn test_same_handle_returned() {
        let factory = Arc::new(CountingFactory::default());
        let cache = TableCache::new(factory.clone(), MetricsScope::Reactor);

        let first = cache.get(1).expect("get should succeed");
        let second = cache.get(1).expect("get should succeed");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_access_creates_once() {
        let factory = Arc::new(CountingFactory::default());
        let cache = TableCache::new(factory.clone(), MetricsScope::Reactor);
        let callers = 16;
        let barrier = Barrier::new(callers);

        let handles: Vec<Arc<dyn TimeSeriesTable>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..callers)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache.get(1).expect("get should succeed")
                    })
                })
                .collect();
            workers
                .into_iter()
                .map(|w| w.join().expect("worker should not panic"))
                .collect()
        });

        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
    }

    #[test]
    fn test_resolutions_cached_separately() {
        let factory = Arc::new(CountingFactory::default());
        let cache = TableCache::new(factory.clone(), MetricsScope::Reactor);

        let seconds = cache.get(1).expect("get should succeed");
        let minutes = cache.get(60).expect("get should succeed");

        assert!(!Arc::ptr_eq(&seconds, &minutes));
        assert_eq!(minutes.resolution(), 60);
        assert_eq!(cache.cached_resolutions(), vec![1, 60]);
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_creation_is_retried() {
        let factory = Arc::new(CountingFactory::default());
        factory.failures_left.store(1, Ordering::SeqCst);
        let cache = TableCache::new(factory.clone(), MetricsScope::Reactor);

        assert!(cache.get(1).is_err());
        assert!(cache.is_empty());

        assert!(cache.get(1).is_ok());
        assert_eq!(cache.len(), 1);
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
    }

    /// Factory whose resolution 60 creation blocks until released.
    struct GatedFactory {
        entered: Mutex<mpsc::Sender<u32>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl MetricsTableFactory for GatedFactory {
        fn create_time_series(
            &self,
            scope: MetricsScope,
            resolution: u32,
        ) -> Result<Arc<dyn TimeSeriesTable>> {
            if resolution == 60 {
                let _ = self.entered.lock().send(resolution);
                let _ = self.release.lock().recv();
            }
            Ok(Arc::new(InMemoryTimeSeriesTable::new(scope, resolution)))
        }

        fn create_aggregates(&self, scope: MetricsScope) -> Result<Arc<dyn AggregatesTable>> {
            Ok(Arc::new(InMemoryAggregatesTable::new(scope)))
        }
    }

    #[test]
    fn test_slow_creation_does_not_block_readers() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let factory = Arc::new(GatedFactory {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let cache = TableCache::new(factory, MetricsScope::Reactor);
        let seconds = cache.get(1).expect("get should succeed");

        std::thread::scope(|scope| {
            let opening = scope.spawn(|| cache.get(60).expect("get should succeed"));
            assert_eq!(entered_rx.recv().expect("creation should start"), 60);

            assert_eq!(cache.cached_resolutions(), vec![1]);
            assert_eq!(cache.len(), 1);
            assert!(Arc::ptr_eq(&cache.get(1).expect("get should succeed"), &seconds));
            assert_eq!(cache.get(5).expect("get should succeed").resolution(), 5);

            release_tx.send(()).expect("creation should be waiting");
            opening.join().expect("worker should not panic");
        });

        assert_eq!(cache.cached_resolutions(), vec![1, 5, 60]);
    }
}
