//! Keyed async critical sections.
//!
//! One `tokio::sync::Mutex` per key, created on first use. Acquisition is
//! bounded by a timeout so a stuck holder surfaces as `StoreError::Timeout`
//! instead of an unbounded wait.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::StoreError;

/// Idle entries are swept once the table grows past this size.
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug)]
pub struct KeyedLocks<K> {
    name: &'static str,
    timeout: Duration,
    table: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of a critical section.
#[derive(Debug)]
pub struct KeyGuard {
    _guard: OwnedMutexGuard<()>,
}

impl<K> KeyedLocks<K>
where
    K: Copy + Eq + Hash + Debug,
{
    pub fn new(name: &'static str, timeout: Duration) -> Self {
        Self {
            name,
            timeout,
            table: Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, key: K) -> Result<KeyGuard, StoreError> {
        let lock = self.slot(key)?;

        match tokio::time::timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(KeyGuard { _guard: guard }),
            Err(_) => {
                tracing::warn!(lock = self.name, key = ?key, timeout_ms = self.timeout.as_millis() as u64, "lock wait timed out");
                Err(StoreError::Timeout(format!("{} lock", self.name)))
            }
        }
    }

    fn slot(&self, key: K) -> Result<Arc<AsyncMutex<()>>, StoreError> {
        let mut table = self
            .table
            .lock()
            .map_err(|_| StoreError::poisoned(self.name))?;

        if table.len() > SWEEP_THRESHOLD {
            // Only the table holds an idle entry.
            table.retain(|_, lock| Arc::strong_count(lock) > 1);
        }

        Ok(table.entry(key).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table.lock().map(|t| t.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_key_waits_other_keys_do_not() {
        let locks = KeyedLocks::new("test", Duration::from_millis(50));

        let held = locks.acquire(1u32).await.unwrap();
        assert!(locks.acquire(2u32).await.is_ok());

        let err = locks.acquire(1u32).await.unwrap_err();
        assert_eq!(err, StoreError::Timeout("test lock".to_string()));

        drop(held);
        assert!(locks.acquire(1u32).await.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_swept() {
        let locks = KeyedLocks::new("test", Duration::from_millis(50));
        for key in 0..(SWEEP_THRESHOLD as u32 + 10) {
            let _guard = locks.acquire(key).await.unwrap();
        }
        assert!(locks.len() <= SWEEP_THRESHOLD + 1);
    }
}
