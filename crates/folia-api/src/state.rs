//! Shared application state for the HTTP layer

use folia_services::{AdjustmentService, CreditService, FolioSequence};
use std::sync::Arc;

/// Services shared across workers
#[derive(Clone)]
pub struct AppState {
    pub credits: Arc<CreditService>,
    pub adjustments: Arc<AdjustmentService>,
    pub folios: Arc<FolioSequence>,
}

impl AppState {
    pub fn new(
        credits: Arc<CreditService>,
        adjustments: Arc<AdjustmentService>,
        folios: Arc<FolioSequence>,
    ) -> Self {
        Self {
            credits,
            adjustments,
            folios,
        }
    }
}
