//! Per-user serialization of mutating operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use common::UserId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of one async mutex per user.
///
/// Every cart mutation, order commit and address mutation for a user runs
/// while holding that user's guard, so concurrent requests for the same user
/// are applied one after another. Requests for different users never
/// contend. Entries nobody holds or waits on are dropped on the next
/// acquisition.
#[derive(Clone, Default)]
pub struct UserLocks {
    inner: Arc<Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to the user's documents.
    pub async fn lock(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|_, m| Arc::strong_count(m) > 1);
            map.entry(user_id).or_default().clone()
        };
        mutex.lock_owned().await
    }

    /// Number of users with a live lock entry.
    pub fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
