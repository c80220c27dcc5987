//! Credit balance model
//!
//! One balance record per professional: a monthly allotment, purchased or
//! granted extra credits, and the count currently reserved against
//! in-progress billable work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account plan enumeration
///
/// Determines the monthly allotment synthesized when a professional has no
/// stored balance yet. Passed explicitly by the caller; privilege is never
/// inferred from the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountPlan {
    /// Standard professional account
    #[default]
    Standard,
    /// Privileged account (clinic owner / supervisor)
    Privileged,
}

impl fmt::Display for AccountPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountPlan::Standard => write!(f, "standard"),
            AccountPlan::Privileged => write!(f, "privileged"),
        }
    }
}

impl AccountPlan {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Some(AccountPlan::Standard),
            "privileged" => Some(AccountPlan::Privileged),
            _ => None,
        }
    }
}

/// Which credit pool a consumption was drawn from
///
/// Monthly credits are use-it-or-lose-it and must be drawn down before
/// extra credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditPool {
    Monthly,
    Extra,
}

impl fmt::Display for CreditPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditPool::Monthly => write!(f, "monthly"),
            CreditPool::Extra => write!(f, "extra"),
        }
    }
}

/// Credit balance entity
///
/// Exclusively mutated by the ledger core; callers go through the
/// reservation/consumption operations, never through raw field writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditBalance {
    /// Professional identifier this balance belongs to
    pub user_id: String,

    /// Allotment reset on a monthly cycle (scheduling the reset is an
    /// external concern; only the timestamp is recorded here)
    pub monthly_credits: u32,

    /// Purchased or administratively granted credits, consumed after the
    /// monthly pool is exhausted
    pub extra_credits: u32,

    /// Credits currently held against in-progress billable work
    pub reserved_credits: u32,

    /// When the monthly allotment was last reset
    pub monthly_reset_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl CreditBalance {
    /// Create a fresh balance with a full monthly allotment
    pub fn new(user_id: impl Into<String>, monthly_credits: u32) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            monthly_credits,
            extra_credits: 0,
            reserved_credits: 0,
            monthly_reset_at: now,
            updated_at: now,
        }
    }

    /// Spendable credits: `monthly + extra - reserved`
    #[inline]
    pub fn available(&self) -> u32 {
        (self.monthly_credits + self.extra_credits).saturating_sub(self.reserved_credits)
    }

    /// Take a one-credit hold. Returns `false` without mutation when no
    /// credit is available.
    pub fn reserve_one(&mut self) -> bool {
        if self.available() < 1 {
            return false;
        }
        self.reserved_credits += 1;
        self.updated_at = Utc::now();
        true
    }

    /// Settle one credit: drop the hold (if any) and deduct from the monthly
    /// pool first, then from extras. Returns the pool drawn from, or `None`
    /// without mutation when both pools are empty.
    pub fn settle_one(&mut self) -> Option<CreditPool> {
        if self.monthly_credits == 0 && self.extra_credits == 0 {
            return None;
        }
        if self.reserved_credits > 0 {
            self.reserved_credits -= 1;
        }
        let pool = if self.monthly_credits > 0 {
            self.monthly_credits -= 1;
            CreditPool::Monthly
        } else {
            self.extra_credits -= 1;
            CreditPool::Extra
        };
        self.updated_at = Utc::now();
        Some(pool)
    }

    /// Drop one outstanding hold without consuming a credit. Returns `false`
    /// when nothing was reserved (idempotent no-op).
    pub fn release_one(&mut self) -> bool {
        if self.reserved_credits == 0 {
            return false;
        }
        self.reserved_credits -= 1;
        self.updated_at = Utc::now();
        true
    }

    /// Add administratively granted credits to the extra pool
    pub fn add_extra(&mut self, amount: u32) {
        self.extra_credits += amount;
        self.updated_at = Utc::now();
    }
}
