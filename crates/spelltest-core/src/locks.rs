//! Per-test mutual exclusion.
//!
//! Answer submissions take a shared guard on their test, so submissions to
//! different slots of one test interleave freely. Finalizing takes the
//! exclusive guard, so it never overlaps a submission on the same test.
//! Guards are scoped to a single operation, and a test's registry entry is
//! dropped as soon as no guard holds or awaits its lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

/// Registry of one lock per test id with an operation in flight.
#[derive(Default)]
pub struct TestLocks {
    locks: Mutex<HashMap<Uuid, Arc<RwLock<()>>>>,
}

/// A held test lock. Dropping it releases the lock and, when it was the
/// last user, the registry entry.
pub struct TestGuard<'a, G> {
    guard: Option<G>,
    test_id: Uuid,
    registry: &'a TestLocks,
}

pub type SubmitGuard<'a> = TestGuard<'a, OwnedRwLockReadGuard<()>>;
pub type FinishGuard<'a> = TestGuard<'a, OwnedRwLockWriteGuard<()>>;

impl<G> Drop for TestGuard<'_, G> {
    fn drop(&mut self) {
        // The owned guard holds a reference to the lock; release it first.
        self.guard.take();
        self.registry.release(self.test_id);
    }
}

impl TestLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<RwLock<()>>>> {
        self.locks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn entry(&self, test_id: Uuid) -> Arc<RwLock<()>> {
        Arc::clone(self.map().entry(test_id).or_default())
    }

    /// Removes the entry once only the registry refers to the lock.
    ///
    /// Callers waiting on the lock hold a clone taken under the map mutex,
    /// so a waiting operation always keeps its entry alive.
    fn release(&self, test_id: Uuid) {
        let mut locks = self.map();
        if locks
            .get(&test_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&test_id);
        }
    }

    /// Shared guard, held while a submission reads and writes its slot.
    pub async fn submit_guard(&self, test_id: Uuid) -> SubmitGuard<'_> {
        let lock = self.entry(test_id);
        TestGuard {
            guard: Some(lock.read_owned().await),
            test_id,
            registry: self,
        }
    }

    /// Exclusive guard, held while a test is finalized.
    pub async fn finish_guard(&self, test_id: Uuid) -> FinishGuard<'_> {
        let lock = self.entry(test_id);
        TestGuard {
            guard: Some(lock.write_owned().await),
            test_id,
            registry: self,
        }
    }

    /// Number of tests with an operation in flight.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
