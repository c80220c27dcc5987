//! Repository traits for the persisted collections
//!
//! Three independent keyed collections back the ledger core: balances by
//! professional, the append-only transaction sequence, and the bounded
//! adjustment sequence. A fourth small collection holds folio counters.

use crate::error::AppError;
use crate::models::{
    AccountPlan, AdminAdjustment, CreditBalance, CreditTransaction, NewAdjustment, NewTransaction,
};
use async_trait::async_trait;

/// Balance store: one record per professional
///
/// `get` synthesizes a plan-appropriate default when no record exists yet.
/// `put` is last-writer-wins; read-modify-write atomicity is the caller's
/// responsibility (per-user locking in the service layer).
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Stored balance, or a fresh default for the given plan
    async fn get(&self, user_id: &str, plan: AccountPlan) -> Result<CreditBalance, AppError>;

    /// Upsert by `user_id`
    async fn put(&self, balance: &CreditBalance) -> Result<(), AppError>;
}

/// Transaction ledger: append-only, immutable once written
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Append a new entry; assigns `id` and `created_at`
    async fn append(&self, entry: NewTransaction) -> Result<CreditTransaction, AppError>;

    /// Entries in insertion order (oldest first), optionally filtered by
    /// professional
    async fn query(&self, user_id: Option<&str>) -> Result<Vec<CreditTransaction>, AppError>;

    /// Entries correlated to one billable session, insertion order
    async fn for_session(&self, session_id: &str) -> Result<Vec<CreditTransaction>, AppError>;
}

/// Bounded administrator adjustment log
///
/// Reads are corruption-tolerant (an unreadable stored log behaves as
/// empty). Appends apply oldest-first eviction beyond the retention cap and
/// retry once with a truncated log when storage capacity is exceeded; a
/// failed retry surfaces as `AppError::AdjustmentNotRecorded`.
#[async_trait]
pub trait AdjustmentLog: Send + Sync {
    /// Append a new adjustment; assigns `id` and `created_at`
    async fn append(&self, entry: NewAdjustment) -> Result<AdminAdjustment, AppError>;

    /// Sum of amounts granted to `user_id` within the given calendar month
    async fn granted_in_month(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> Result<u32, AppError>;

    /// Entries in insertion order, optionally filtered by recipient
    async fn list(&self, user_id: Option<&str>) -> Result<Vec<AdminAdjustment>, AppError>;
}

/// Per-scope folio counters
#[async_trait]
pub trait FolioCounters: Send + Sync {
    /// Next counter value for the scope, starting at 1; durable before return
    async fn next(&self, scope: &str) -> Result<u64, AppError>;
}
