//! Audit event emission
//!
//! Every mutating ledger operation emits one structured event (actor,
//! action, target professional, amount) in addition to its domain ledger
//! entry. This is a logging side effect consumed by the external audit
//! subsystem, never a correctness dependency.

use tracing::info;

/// Emit one audit event on the dedicated `audit` target
pub fn record(actor: &str, action: &str, target_user: &str, amount: u32) {
    info!(
        target: "audit",
        actor,
        action,
        target_user,
        amount,
        "ledger operation"
    );
}
