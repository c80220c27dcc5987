//! Balance store implementation
//!
//! One `CreditBalance` per professional, cached in memory and written
//! through as a single keyed document. A missing or unreadable document
//! self-heals to an empty collection; a missing record synthesizes a
//! plan-appropriate default without persisting it.

use crate::backend::StorageBackend;
use async_trait::async_trait;
use folia_core::config::CreditsConfig;
use folia_core::models::{AccountPlan, CreditBalance};
use folia_core::traits::BalanceStore;
use folia_core::{AppError, AppResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

const COLLECTION: &str = "balances";

/// Write-through balance store
pub struct PersistentBalanceStore {
    backend: Arc<dyn StorageBackend>,
    credits: CreditsConfig,
    state: Mutex<HashMap<String, CreditBalance>>,
}

impl PersistentBalanceStore {
    pub fn new(backend: Arc<dyn StorageBackend>, credits: CreditsConfig) -> Self {
        let state = load(backend.as_ref());
        Self {
            backend,
            credits,
            state: Mutex::new(state),
        }
    }

    fn persist(&self, state: &HashMap<String, CreditBalance>) -> AppResult<()> {
        let doc = serde_json::to_string(state)?;
        self.backend
            .write(COLLECTION, &doc)
            .map_err(|e| AppError::Storage(e.to_string()))
    }
}

fn load(backend: &dyn StorageBackend) -> HashMap<String, CreditBalance> {
    match backend.read(COLLECTION) {
        Ok(Some(doc)) => match serde_json::from_str(&doc) {
            Ok(state) => state,
            Err(e) => {
                warn!("Discarding corrupted balances document: {}", e);
                HashMap::new()
            }
        },
        Ok(None) => HashMap::new(),
        Err(e) => {
            warn!("Balances document unreadable, starting empty: {}", e);
            HashMap::new()
        }
    }
}

#[async_trait]
impl BalanceStore for PersistentBalanceStore {
    async fn get(&self, user_id: &str, plan: AccountPlan) -> AppResult<CreditBalance> {
        let state = self.state.lock();
        Ok(state
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| CreditBalance::new(user_id, self.credits.allotment(plan))))
    }

    async fn put(&self, balance: &CreditBalance) -> AppResult<()> {
        let mut state = self.state.lock();
        let previous = state.insert(balance.user_id.clone(), balance.clone());
        if let Err(e) = self.persist(&state) {
            // keep memory and storage consistent when the write is refused
            match previous {
                Some(prev) => state.insert(balance.user_id.clone(), prev),
                None => state.remove(&balance.user_id),
            };
            return Err(e);
        }
        Ok(())
    }
}
