//! Per-professional lock registry
//!
//! Every balance mutation is a read-modify-write over one professional's
//! record. Holding the professional's mutex for the whole operation means
//! two concurrent reservations can never both observe `available >= 1` and
//! overdraw the balance. The registry is shared between the credit and
//! adjustment services, so a grant serializes with the recipient's own
//! operations.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Registry of per-`user_id` async mutexes
#[derive(Default)]
pub struct UserLocks {
    inner: DashMap<String, Arc<Mutex<()>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutex guarding the given professional's balance
    pub fn for_user(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.inner
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_user_gets_same_lock() {
        let locks = UserLocks::new();
        let a = locks.for_user("u1");
        let b = locks.for_user("u1");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_different_users_do_not_contend() {
        let locks = UserLocks::new();
        let a = locks.for_user("u1");
        let b = locks.for_user("u2");
        let _ga = a.lock().await;
        // must not deadlock
        let _gb = b.lock().await;
    }
}
