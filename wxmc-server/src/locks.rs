//! Per-user request serialization
//!
//! Upload, clear and predict for one user run one at a time; requests for
//! different users never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry of one async mutex per user id
#[derive(Clone, Default)]
pub struct UserLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`'s model
    pub async fn lock(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            // Entries only the registry still references are idle
            map.retain(|id, m| *id == user_id || Arc::strong_count(m) > 1);
            map.entry(user_id).or_default().clone()
        };
        mutex.lock_owned().await
    }

    /// Number of users with a live or recently released lock
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
