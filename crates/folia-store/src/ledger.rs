//! Transaction ledger implementation
//!
//! Append-only sequence of balance-affecting events. Entries get a
//! monotonic id and are never mutated or removed by this core.

use crate::backend::StorageBackend;
use async_trait::async_trait;
use chrono::Utc;
use folia_core::models::{CreditTransaction, NewTransaction};
use folia_core::traits::TransactionLedger;
use folia_core::{AppError, AppResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

const COLLECTION: &str = "transactions";

struct LedgerState {
    entries: Vec<CreditTransaction>,
    next_id: i64,
}

/// Write-through append-only ledger
pub struct PersistentTransactionLedger {
    backend: Arc<dyn StorageBackend>,
    state: Mutex<LedgerState>,
}

impl PersistentTransactionLedger {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        let entries = load(backend.as_ref());
        let next_id = entries.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        Self {
            backend,
            state: Mutex::new(LedgerState { entries, next_id }),
        }
    }

    fn persist(&self, entries: &[CreditTransaction]) -> AppResult<()> {
        let doc = serde_json::to_string(entries)?;
        self.backend
            .write(COLLECTION, &doc)
            .map_err(|e| AppError::Storage(e.to_string()))
    }
}

fn load(backend: &dyn StorageBackend) -> Vec<CreditTransaction> {
    match backend.read(COLLECTION) {
        Ok(Some(doc)) => match serde_json::from_str(&doc) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Discarding corrupted transaction ledger: {}", e);
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("Transaction ledger unreadable, starting empty: {}", e);
            Vec::new()
        }
    }
}

#[async_trait]
impl TransactionLedger for PersistentTransactionLedger {
    async fn append(&self, entry: NewTransaction) -> AppResult<CreditTransaction> {
        let mut state = self.state.lock();
        let tx = CreditTransaction {
            id: state.next_id,
            user_id: entry.user_id,
            kind: entry.kind,
            amount: entry.amount,
            description: entry.description,
            session_id: entry.session_id,
            created_at: Utc::now(),
        };
        state.entries.push(tx.clone());
        if let Err(e) = self.persist(&state.entries) {
            state.entries.pop();
            return Err(e);
        }
        state.next_id += 1;
        Ok(tx)
    }

    async fn query(&self, user_id: Option<&str>) -> AppResult<Vec<CreditTransaction>> {
        let state = self.state.lock();
        Ok(state
            .entries
            .iter()
            .filter(|t| user_id.map_or(true, |u| t.user_id == u))
            .cloned()
            .collect())
    }

    async fn for_session(&self, session_id: &str) -> AppResult<Vec<CreditTransaction>> {
        let state = self.state.lock();
        Ok(state
            .entries
            .iter()
            .filter(|t| t.session_id.as_deref() == Some(session_id))
            .cloned()
            .collect())
    }
}
