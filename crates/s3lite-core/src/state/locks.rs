//! Per-key write exclusion.
//!
//! [`KeyLocks`] hands out an async mutex per key so that writers of the same
//! key (put, delete, multipart completion) run one at a time while writers
//! of different keys proceed in parallel. Entries are dropped from the table
//! once the last holder or waiter lets go.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table of per-key async mutexes.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyLocks {
    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> KeyGuard<'_> {
        let mutex = Arc::clone(self.locks.entry(key.to_owned()).or_default().value());
        let guard = mutex.lock_owned().await;
        KeyGuard {
            table: self,
            key: key.to_owned(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently locked or awaited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key is locked or awaited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one key; released on drop.
#[derive(Debug)]
pub struct KeyGuard<'a> {
    table: &'a KeyLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the table's own reference left means nobody holds or awaits it.
        self.table
            .locks
            .remove_if(&self.key, |_, m| Arc::strong_count(m) == 1);
    }
}
