//! Process-wide keyed lock table.
//!
//! One async mutex per key, created on first use and pruned once nobody holds
//! or waits on it. Keys of one acquisition are taken in sorted order, so two
//! callers locking overlapping key sets cannot deadlock.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use ledger_types::AppError;

type Slots = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Keyed mutual exclusion with a bounded wait.
pub struct KeyedLocks {
    slots: Slots,
    wait: Duration,
}

impl KeyedLocks {
    pub fn new(wait: Duration) -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
            wait,
        }
    }

    /// Locks every key, sorted and deduplicated.
    ///
    /// Waiting longer than the configured bound for any one key is a
    /// [`AppError::ConcurrencyConflict`]; keys already taken are released.
    pub async fn acquire<I, K>(&self, keys: I) -> Result<LockSet, AppError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        keys.sort();
        keys.dedup();

        let mut held = LockSet {
            slots: Arc::clone(&self.slots),
            guards: Vec::with_capacity(keys.len()),
            keys: Vec::with_capacity(keys.len()),
        };

        for key in keys {
            let slot = Arc::clone(
                self.slots
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .value(),
            );

            match tokio::time::timeout(self.wait, slot.lock_owned()).await {
                Ok(guard) => {
                    held.guards.push(guard);
                    held.keys.push(key);
                }
                Err(_) => {
                    tracing::warn!(key = %key, wait_ms = self.wait.as_millis() as u64, "Lock wait exceeded");
                    // Let the slot be pruned if we were its only user.
                    held.keys.push(key.clone());
                    return Err(AppError::ConcurrencyConflict(format!(
                        "Timed out waiting for {}",
                        key
                    )));
                }
            }
        }

        Ok(held)
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Locks held by one caller. Dropping it releases them.
pub struct LockSet {
    slots: Slots,
    guards: Vec<OwnedMutexGuard<()>>,
    keys: Vec<String>,
}

impl Drop for LockSet {
    fn drop(&mut self) {
        self.guards.clear();
        for key in self.keys.drain(..) {
            self.slots
                .remove_if(&key, |_, slot| Arc::strong_count(slot) == 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disjoint_keys_do_not_block() {
        let locks = KeyedLocks::new(Duration::from_millis(50));

        let _a = locks.acquire(["alice"]).await.unwrap();
        let _b = locks.acquire(["bob"]).await.unwrap();

        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_held_key_times_out() {
        let locks = KeyedLocks::new(Duration::from_millis(20));

        let _held = locks.acquire(["alice", "bob"]).await.unwrap();
        let result = locks.acquire(["bob", "carol"]).await;

        assert!(matches!(result, Err(AppError::ConcurrencyConflict(_))));
    }

    #[tokio::test]
    async fn test_release_prunes_slots() {
        let locks = KeyedLocks::new(Duration::from_millis(50));

        {
            let _held = locks.acquire(["bob", "alice", "alice"]).await.unwrap();
            assert_eq!(locks.len(), 2);
        }

        assert!(locks.is_empty());
        let _again = locks.acquire(["alice"]).await.unwrap();
    }

    #[tokio::test]
    async fn test_waiter_proceeds_after_release() {
        let locks = Arc::new(KeyedLocks::new(Duration::from_secs(1)));
        let held = locks.acquire(["alice"]).await.unwrap();

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move { locks.acquire(["alice"]).await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(held);

        assert!(waiter.await.unwrap().is_ok());
    }
}
