//! Administrator adjustment model
//!
//! One entry per granted top-up, kept in its own bounded log, separate from
//! the transaction ledger. Entries are created only by a successful quota
//! check and never mutated afterwards.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Administrator adjustment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAdjustment {
    /// Unique identifier
    pub id: Uuid,

    /// Recipient professional
    pub user_id: String,

    /// Recipient display name (denormalized for audit display)
    pub user_name: String,

    /// Credits granted; always positive
    pub amount: u32,

    /// Justification; at least 20 characters
    pub reason: String,

    /// Granting administrator
    pub admin_id: String,

    /// Administrator display name
    pub admin_name: String,

    /// Timestamp assigned by the log
    pub created_at: DateTime<Utc>,
}

impl AdminAdjustment {
    /// Whether this grant counts against the given calendar month's quota
    pub fn in_month(&self, year: i32, month: u32) -> bool {
        self.created_at.year() == year && self.created_at.month() == month
    }
}

/// Data for appending a new adjustment (`id` and `created_at` are assigned
/// by the log)
#[derive(Debug, Clone)]
pub struct NewAdjustment {
    pub user_id: String,
    pub user_name: String,
    pub amount: u32,
    pub reason: String,
    pub admin_id: String,
    pub admin_name: String,
}
