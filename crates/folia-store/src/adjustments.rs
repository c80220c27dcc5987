//! Bounded administrator adjustment log
//!
//! Separate from the transaction ledger, capped at a fixed number of
//! entries with oldest-first eviction. The grant flow depends on this log
//! being durable: an append that cannot be persisted (even after the
//! truncate-and-retry pass) must fail so the balance mutation is never
//! applied without its audit record.

use crate::backend::{StorageBackend, StorageError};
use async_trait::async_trait;
use chrono::Utc;
use folia_core::models::{AdminAdjustment, NewAdjustment};
use folia_core::traits::AdjustmentLog;
use folia_core::{AppError, AppResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

const COLLECTION: &str = "adjustments";

/// Write-through bounded adjustment log
pub struct PersistentAdjustmentLog {
    backend: Arc<dyn StorageBackend>,
    entries: Mutex<Vec<AdminAdjustment>>,
    max_entries: usize,
}

impl PersistentAdjustmentLog {
    /// `max_entries` must be sized to cover at least one month of grants,
    /// or eviction could remove entries the quota check still needs.
    pub fn new(backend: Arc<dyn StorageBackend>, max_entries: usize) -> Self {
        let entries = load(backend.as_ref());
        Self {
            backend,
            entries: Mutex::new(entries),
            max_entries: max_entries.max(1),
        }
    }

    fn persist(&self, entries: &[AdminAdjustment]) -> Result<(), StorageError> {
        let doc = serde_json::to_string(entries)
            .map_err(|e| StorageError::Io(e.to_string()))?;
        self.backend.write(COLLECTION, &doc)
    }

    fn evict_to(entries: &mut Vec<AdminAdjustment>, keep: usize) {
        if entries.len() > keep {
            let excess = entries.len() - keep;
            entries.drain(..excess);
        }
    }
}

fn load(backend: &dyn StorageBackend) -> Vec<AdminAdjustment> {
    match backend.read(COLLECTION) {
        Ok(Some(doc)) => match serde_json::from_str(&doc) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Discarding corrupted adjustment log: {}", e);
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("Adjustment log unreadable, starting empty: {}", e);
            Vec::new()
        }
    }
}

#[async_trait]
impl AdjustmentLog for PersistentAdjustmentLog {
    async fn append(&self, entry: NewAdjustment) -> AppResult<AdminAdjustment> {
        let adjustment = AdminAdjustment {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            user_name: entry.user_name,
            amount: entry.amount,
            reason: entry.reason,
            admin_id: entry.admin_id,
            admin_name: entry.admin_name,
            created_at: Utc::now(),
        };

        let mut entries = self.entries.lock();
        entries.push(adjustment.clone());

        // scheduled retention, applied on every append rather than only
        // when a write fails
        Self::evict_to(&mut entries, self.max_entries);

        match self.persist(&entries) {
            Ok(()) => Ok(adjustment),
            Err(StorageError::CapacityExceeded) => {
                warn!("Adjustment log over capacity, truncating and retrying once");
                Self::evict_to(&mut entries, (self.max_entries / 2).max(1));
                match self.persist(&entries) {
                    Ok(()) => Ok(adjustment),
                    Err(e) => {
                        entries.retain(|a| a.id != adjustment.id);
                        Err(AppError::AdjustmentNotRecorded(e.to_string()))
                    }
                }
            }
            Err(e) => {
                entries.retain(|a| a.id != adjustment.id);
                Err(AppError::AdjustmentNotRecorded(e.to_string()))
            }
        }
    }

    async fn granted_in_month(&self, user_id: &str, year: i32, month: u32) -> AppResult<u32> {
        let entries = self.entries.lock();
        Ok(entries
            .iter()
            .filter(|a| a.user_id == user_id && a.in_month(year, month))
            .map(|a| a.amount)
            .sum())
    }

    async fn list(&self, user_id: Option<&str>) -> AppResult<Vec<AdminAdjustment>> {
        let entries = self.entries.lock();
        Ok(entries
            .iter()
            .filter(|a| user_id.map_or(true, |u| a.user_id == u))
            .cloned()
            .collect())
    }
}
