//! Per-application-name mutual exclusion.
//!
//! Two deploys of the same app would both try to create (or delete) it on
//! the platform. Holding the name's lock for the whole operation serializes
//! them; different names never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
pub struct NameLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl NameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `name`. Released when the guard drops.
    pub async fn acquire(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries nobody holds or waits on can go.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        if lock.try_lock().is_err() {
            debug!(app = name, "waiting for in-flight operation on app");
        }
        lock.lock_owned().await
    }

    /// Names currently locked or waited on.
    #[cfg(test)]
    async fn held(&self) -> usize {
        self.locks
            .lock()
            .await
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_name_is_serialized() {
        let locks = Arc::new(NameLocks::new());
        let guard = locks.acquire("myapp").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("myapp").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn different_names_do_not_block() {
        let locks = NameLocks::new();
        let _a = locks.acquire("a").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b"))
            .await
            .unwrap();
        assert_eq!(locks.held().await, 2);
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = NameLocks::new();
        drop(locks.acquire("a").await);
        let _b = locks.acquire("b").await;
        assert_eq!(locks.locks.lock().await.len(), 1);
    }
}
