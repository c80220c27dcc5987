//! Credit transaction model
//!
//! Append-only record of every balance-affecting event. Entries are
//! immutable once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Monthly allotment credited
    MonthlyAllocation,
    /// Purchased or administratively granted extra credits
    Purchase,
    /// Permanent deduction on completion of billable work
    Consumption,
    /// Temporary one-credit hold before billable work starts
    Reservation,
    /// Cancellation of a hold for abandoned work
    Release,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::MonthlyAllocation => write!(f, "monthly_allocation"),
            TransactionKind::Purchase => write!(f, "purchase"),
            TransactionKind::Consumption => write!(f, "consumption"),
            TransactionKind::Reservation => write!(f, "reservation"),
            TransactionKind::Release => write!(f, "release"),
        }
    }
}

/// Credit transaction entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    /// Monotonic identifier assigned by the ledger
    pub id: i64,

    /// Professional the event applies to
    pub user_id: String,

    /// Event kind
    pub kind: TransactionKind,

    /// Whole credits moved; always positive, the kind carries the direction
    pub amount: u32,

    /// Human-readable description for audit display
    pub description: String,

    /// Billable unit this event correlates to, when applicable
    pub session_id: Option<String>,

    /// Timestamp assigned by the ledger
    pub created_at: DateTime<Utc>,
}

/// Data for appending a new ledger entry (`id` and `created_at` are
/// assigned by the ledger)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: String,
    pub kind: TransactionKind,
    pub amount: u32,
    pub description: String,
    pub session_id: Option<String>,
}

impl NewTransaction {
    /// One-credit hold against a billable session
    pub fn reservation(user_id: &str, session_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind: TransactionKind::Reservation,
            amount: 1,
            description: format!("Credit reserved for session {}", session_id),
            session_id: Some(session_id.to_string()),
        }
    }

    /// One-credit settlement on session completion
    pub fn consumption(user_id: &str, session_id: &str, pool: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind: TransactionKind::Consumption,
            amount: 1,
            description: format!(
                "Credit consumed for session {} (drawn from {} pool)",
                session_id, pool
            ),
            session_id: Some(session_id.to_string()),
        }
    }

    /// One-credit hold cancellation for an abandoned session
    pub fn release(user_id: &str, session_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind: TransactionKind::Release,
            amount: 1,
            description: format!("Credit released for abandoned session {}", session_id),
            session_id: Some(session_id.to_string()),
        }
    }

    /// Monthly allotment reset, driven by an external scheduler
    pub fn monthly_allocation(user_id: &str, amount: u32) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind: TransactionKind::MonthlyAllocation,
            amount,
            description: format!("Monthly allotment reset to {} credits", amount),
            session_id: None,
        }
    }

    /// Extra credits granted by an administrator
    pub fn admin_grant(user_id: &str, amount: u32, admin_name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind: TransactionKind::Purchase,
            amount,
            description: format!("{} extra credits granted by {}", amount, admin_name),
            session_id: None,
        }
    }
}
