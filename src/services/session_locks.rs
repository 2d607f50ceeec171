use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

/// One async mutex per session id. Holding the guard serializes every
/// read-modify-write on that session; different sessions never contend.
#[derive(Clone, Default)]
pub struct SessionLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, session_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            // Drop entries no task is holding or waiting on.
            map.retain(|_, l| Arc::strong_count(l) > 1);
            map.entry(session_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}
