//! Per-pid critical sections
//!
//! `fetch → check state → (send) → write` on one pid must not interleave with
//! another operation on the same pid, or both could observe the same
//! precondition and commit conflicting transitions.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

#[derive(Clone, Default)]
pub struct PidLocks {
    lock_map: Arc<LockMap>,
}

impl PidLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `pid`.
    ///
    /// The guard is owned, so it can be held across the outbound send. The
    /// map entry is dropped with the last guard or waiter for `pid`.
    pub async fn acquire(&self, pid: &str) -> PidGuard {
        // Clone the mutex out before awaiting; holding the shard guard across
        // the await would block every other pid in the same shard.
        let mutex = self
            .lock_map
            .entry(pid.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        PidGuard {
            guard: Some(mutex.lock_owned().await),
            pid: pid.to_string(),
            lock_map: self.lock_map.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_map.is_empty()
    }
}

/// Exclusive access to one pid, released on drop
pub struct PidGuard {
    guard: Option<OwnedMutexGuard<()>>,
    pid: String,
    lock_map: Arc<LockMap>,
}

impl Drop for PidGuard {
    fn drop(&mut self) {
        // Release first so our own Arc no longer counts
        drop(self.guard.take());
        // Waiters hold a clone, and `acquire` clones under the same shard lock
        self.lock_map
            .remove_if(&self.pid, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
