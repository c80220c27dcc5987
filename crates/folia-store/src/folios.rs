//! Folio counter storage
//!
//! Small keyed collection of per-clinic-scope counters backing the
//! human-readable record number sequence. The counter is made durable
//! before the value is handed out, so a crash never reissues a number.

use crate::backend::StorageBackend;
use async_trait::async_trait;
use folia_core::traits::FolioCounters;
use folia_core::{AppError, AppResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

const COLLECTION: &str = "folios";

/// Write-through folio counters
pub struct PersistentFolioCounters {
    backend: Arc<dyn StorageBackend>,
    counters: Mutex<HashMap<String, u64>>,
}

impl PersistentFolioCounters {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        let counters = load(backend.as_ref());
        Self {
            backend,
            counters: Mutex::new(counters),
        }
    }

    fn persist(&self, counters: &HashMap<String, u64>) -> AppResult<()> {
        let doc = serde_json::to_string(counters)?;
        self.backend
            .write(COLLECTION, &doc)
            .map_err(|e| AppError::Storage(e.to_string()))
    }
}

fn load(backend: &dyn StorageBackend) -> HashMap<String, u64> {
    match backend.read(COLLECTION) {
        Ok(Some(doc)) => match serde_json::from_str(&doc) {
            Ok(counters) => counters,
            Err(e) => {
                warn!("Discarding corrupted folio counters: {}", e);
                HashMap::new()
            }
        },
        Ok(None) => HashMap::new(),
        Err(e) => {
            warn!("Folio counters unreadable, starting empty: {}", e);
            HashMap::new()
        }
    }
}

#[async_trait]
impl FolioCounters for PersistentFolioCounters {
    async fn next(&self, scope: &str) -> AppResult<u64> {
        let mut counters = self.counters.lock();
        let value = counters.get(scope).copied().unwrap_or(0) + 1;
        counters.insert(scope.to_string(), value);
        if let Err(e) = self.persist(&counters) {
            match value - 1 {
                0 => counters.remove(scope),
                prev => counters.insert(scope.to_string(), prev),
            };
            return Err(e);
        }
        Ok(value)
    }
}
