//! Per-user lock registry
//!
//! Credit balances are read-modify-write at the storage boundary, so every
//! mutation of a user's balance (purchase debit, approval credit, redemption
//! credit) must hold that user's lock for the whole sequence. Locks for
//! different users never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, Weak};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::entities::UserId;

/// Registry of per-user-id async mutexes.
///
/// Entries are held weakly: a lock lives exactly as long as someone holds
/// or waits on it, so the registry does not grow with the user table.
#[derive(Default)]
pub struct UserLocks {
    inner: StdMutex<HashMap<UserId, Weak<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a user id, creating it on first use.
    pub async fn acquire(&self, id: &UserId) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().expect("lock registry poisoned");
            map.retain(|_, weak| weak.strong_count() > 0);
            match map.get(id).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(Mutex::new(()));
                    map.insert(id.clone(), Arc::downgrade(&lock));
                    lock
                }
            }
        };
        entry.lock_owned().await
    }

    #[cfg(test)]
    fn registered(&self) -> usize {
        self.inner.lock().expect("lock registry poisoned").len()
    }
}
