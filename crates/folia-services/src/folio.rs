//! Folio sequence generator
//!
//! Produces a human-readable unique record number per clinic scope, e.g.
//! `FOL-LIMA-2026-00042`. Uniqueness comes from the durable per-scope
//! counter; the rendered year is informational only.

use chrono::{Datelike, Utc};
use folia_core::traits::FolioCounters;
use folia_core::{AppError, AppResult};
use std::sync::Arc;
use tracing::instrument;

/// Record number generator over the persisted per-scope counters
pub struct FolioSequence {
    counters: Arc<dyn FolioCounters>,
}

impl FolioSequence {
    pub fn new(counters: Arc<dyn FolioCounters>) -> Self {
        Self { counters }
    }

    /// Next record number for the clinic scope
    #[instrument(skip(self))]
    pub async fn next(&self, scope: &str) -> AppResult<String> {
        let scope = scope.trim();
        if scope.is_empty() {
            return Err(AppError::Validation(
                "folio scope must not be empty".to_string(),
            ));
        }
        let value = self.counters.next(&scope.to_lowercase()).await?;
        Ok(format!(
            "FOL-{}-{}-{:05}",
            scope.to_uppercase(),
            Utc::now().year(),
            value
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folia_store::{MemoryBackend, PersistentFolioCounters};

    fn sequence() -> FolioSequence {
        FolioSequence::new(Arc::new(PersistentFolioCounters::new(Arc::new(
            MemoryBackend::new(),
        ))))
    }

    #[tokio::test]
    async fn test_folio_format_and_sequence() {
        let seq = sequence();
        let year = Utc::now().year();
        assert_eq!(
            seq.next("lima").await.unwrap(),
            format!("FOL-LIMA-{}-00001", year)
        );
        assert_eq!(
            seq.next("Lima").await.unwrap(),
            format!("FOL-LIMA-{}-00002", year)
        );
        assert_eq!(
            seq.next("cusco").await.unwrap(),
            format!("FOL-CUSCO-{}-00001", year)
        );
    }

    #[tokio::test]
    async fn test_empty_scope_is_rejected() {
        let seq = sequence();
        let err = seq.next("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
