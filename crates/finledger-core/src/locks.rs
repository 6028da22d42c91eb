//! Advisory locks keyed by `(owner, period)` that serialize closures.

use std::{
    collections::HashSet,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
};

use finledger_domain::{OwnerId, Period};

/// Registry of periods currently being closed.
///
/// Only one caller at a time may hold the guard for a given `(owner, period)`; other
/// callers for the same key block until it is released. Different keys never contend.
#[derive(Debug, Default)]
pub struct PeriodLocks {
    held: Mutex<HashSet<(OwnerId, Period)>>,
    released: Condvar,
}

impl PeriodLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the key is free, then takes it.
    pub fn acquire(&self, owner: OwnerId, period: Period) -> PeriodGuard<'_> {
        let key = (owner, period);
        let mut held = self.registry();
        while held.contains(&key) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(key);
        PeriodGuard { locks: self, key }
    }

    /// Takes the key only if nobody holds it.
    pub fn try_acquire(&self, owner: OwnerId, period: Period) -> Option<PeriodGuard<'_>> {
        let key = (owner, period);
        let mut held = self.registry();
        if !held.insert(key) {
            return None;
        }
        Some(PeriodGuard { locks: self, key })
    }

    pub fn is_held(&self, owner: OwnerId, period: Period) -> bool {
        self.registry().contains(&(owner, period))
    }

    // A panic while holding the registry mutex cannot leave the set inconsistent.
    fn registry(&self) -> MutexGuard<'_, HashSet<(OwnerId, Period)>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, key: &(OwnerId, Period)) {
        self.registry().remove(key);
        self.released.notify_all();
    }
}

/// Releases its `(owner, period)` key on drop.
#[derive(Debug)]
pub struct PeriodGuard<'a> {
    locks: &'a PeriodLocks,
    key: (OwnerId, Period),
}

impl PeriodGuard<'_> {
    pub fn period(&self) -> Period {
        self.key.1
    }
}

impl Drop for PeriodGuard<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.key);
    }
}
