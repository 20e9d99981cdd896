//! Per-key mutual exclusion for in-flight analyses.
//!
//! [`KeyedLocks::acquire`] hands out one async lock per document id. The
//! first caller for an id proceeds; later callers for the same id wait
//! until the guard is dropped. Callers for different ids never contend.
//! Each entry counts its holders and waiters, including waiters whose
//! `acquire` future is dropped before it resolves, and is removed when
//! that count reaches zero.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OwnedMutexGuard;

/// One id's lock plus the number of holders and waiters using it.
#[derive(Default)]
struct Slot {
    lock: Arc<tokio::sync::Mutex<()>>,
    users: usize,
}

#[derive(Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<String, Slot>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait for exclusive access to `key`.
    ///
    /// The caller is registered before it starts waiting, so dropping this
    /// future mid-wait still releases its share of the slot.
    pub async fn acquire(self: &Arc<Self>, key: &str) -> KeyGuard {
        let lock = {
            let mut slots = self.slots();
            let slot = slots.entry(key.to_string()).or_default();
            slot.users += 1;
            Arc::clone(&slot.lock)
        };

        let mut guard = KeyGuard {
            locks: Arc::clone(self),
            key: key.to_string(),
            held: None,
        };
        guard.held = Some(lock.lock_owned().await);
        guard
    }

    /// Number of ids with a holder or waiter.
    pub fn in_flight(&self) -> usize {
        self.slots().len()
    }
}

/// Exclusive access to one key; released on drop.
pub struct KeyGuard {
    locks: Arc<KeyedLocks>,
    key: String,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        self.held.take();

        let mut slots = self.locks.slots();
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}
