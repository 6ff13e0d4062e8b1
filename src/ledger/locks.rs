//! Per-key mutual exclusion with a bounded wait.

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use super::StoreError;

/// Grants exclusive access per key.
///
/// Holders of different keys never block each other. A waiter that cannot
/// acquire its key within the timeout gets [`StoreError::Timeout`].
#[derive(Debug)]
pub struct KeyedLocks<K> {
    held: Mutex<HashSet<K>>,
    released: Condvar,
    timeout: Duration,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone + Display,
{
    /// Creates an empty lock table with the given acquisition timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            timeout,
        }
    }

    /// Blocks until `key` is free, then holds it until the guard drops.
    pub fn acquire(&self, key: &K) -> Result<KeyGuard<'_, K>, StoreError> {
        let deadline = Instant::now() + self.timeout;
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());

        while held.contains(key) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!(key = %key, "Lock wait timed out");
                return Err(StoreError::Timeout {
                    operation: format!("ledger lock for {key}"),
                });
            }
            let (guard, _) = self
                .released
                .wait_timeout(held, remaining)
                .unwrap_or_else(|e| e.into_inner());
            held = guard;
        }

        held.insert(key.clone());
        Ok(KeyGuard {
            locks: self,
            key: key.clone(),
        })
    }

    /// Returns true if `key` is currently held.
    pub fn is_held(&self, key: &K) -> bool {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }
}

/// Releases its key on drop.
#[derive(Debug)]
pub struct KeyGuard<'a, K>
where
    K: Eq + Hash,
{
    locks: &'a KeyedLocks<K>,
    key: K,
}

impl<K> Drop for KeyGuard<'_, K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        let mut held = self.locks.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(&self.key);
        drop(held);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_guard_releases_on_drop() {
        let locks = KeyedLocks::new(Duration::from_millis(50));
        let key = "emp_001".to_string();
        {
            let _guard = locks.acquire(&key).unwrap();
            assert!(locks.is_held(&key));
        }
        assert!(!locks.is_held(&key));
        assert!(locks.acquire(&key).is_ok());
    }

    #[test]
    fn test_distinct_keys_do_not_block() {
        let locks = KeyedLocks::new(Duration::from_millis(50));
        let _first = locks.acquire(&"emp_001".to_string()).unwrap();
        assert!(locks.acquire(&"emp_002".to_string()).is_ok());
    }

    #[test]
    fn test_held_key_times_out() {
        let locks = KeyedLocks::new(Duration::from_millis(20));
        let key = "emp_001".to_string();
        let _guard = locks.acquire(&key).unwrap();

        let result = locks.acquire(&key);
        assert!(matches!(result, Err(StoreError::Timeout { .. })));
    }

    #[test]
    fn test_contended_key_serializes_holders() {
        let locks = Arc::new(KeyedLocks::new(Duration::from_secs(5)));
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    let _guard = locks.acquire(&"emp_001".to_string()).unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(2));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
