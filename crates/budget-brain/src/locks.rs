//! Per-user serialisation of command handling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = HashMap<i64, Arc<Mutex<()>>>;

/// Hands out one async mutex per user id.
///
/// Holding the guard for the whole command keeps the read, rollover and
/// write of a user's account from interleaving with another command from the
/// same user. A user's entry is dropped again once nobody holds or waits for
/// it, so the map only grows with concurrent users.
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    // Only touched between awaits, so a blocking mutex is enough.
    locks: Arc<StdMutex<LockMap>>,
}

/// Exclusive access to one user's account until dropped.
pub struct UserGuard {
    user_id: i64,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<StdMutex<LockMap>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock for `user_id`.
    pub async fn lock(&self, user_id: i64) -> UserGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(user_id).or_default().clone()
        };
        UserGuard {
            user_id,
            guard: Some(lock.lock_owned().await),
            locks: self.locks.clone(),
        }
    }

    /// Number of users with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for UserGuard {
    fn drop(&mut self) {
        self.guard.take();

        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Waiters hold a clone of the Arc, so a count of one means idle.
        if locks
            .get(&self.user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.user_id);
        }
    }
}

impl std::fmt::Debug for UserGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserGuard")
            .field("user_id", &self.user_id)
            .finish()
    }
}
