//! Credit reservation/consumption lifecycle
//!
//! Governs one billable clinical session from creation to credit
//! settlement: `NoReservation -> Reserved -> {Consumed | Released}`. The
//! session state is derived from the ledger at decision time, so a double
//! reservation or a consumption without a prior hold is rejected loudly as
//! a caller-protocol defect rather than silently absorbed.

use crate::audit;
use crate::locks::UserLocks;
use folia_core::config::CreditsConfig;
use folia_core::models::{
    AccountPlan, CreditBalance, CreditPool, CreditTransaction, NewTransaction, TransactionKind,
};
use folia_core::traits::{BalanceStore, TransactionLedger};
use folia_core::{AppError, AppResult};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Result of a reservation attempt
///
/// An insufficient balance is a recoverable, user-facing condition and is
/// reported through `reserved = false`, not through an error.
#[derive(Debug, Clone)]
pub struct ReserveOutcome {
    pub reserved: bool,
    pub available: u32,
}

/// Result of a successful consumption
#[derive(Debug, Clone)]
pub struct ConsumeOutcome {
    /// Pool the credit was drawn from (monthly before extra)
    pub pool: CreditPool,
    pub balance: CreditBalance,
}

/// Result of a release
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    /// `false` when nothing was reserved (idempotent no-op)
    pub released: bool,
}

/// Reservation/consumption state machine over the balance store and ledger
pub struct CreditService {
    balances: Arc<dyn BalanceStore>,
    ledger: Arc<dyn TransactionLedger>,
    locks: Arc<UserLocks>,
    credits: CreditsConfig,
}

impl CreditService {
    pub fn new(
        balances: Arc<dyn BalanceStore>,
        ledger: Arc<dyn TransactionLedger>,
        locks: Arc<UserLocks>,
        credits: CreditsConfig,
    ) -> Self {
        Self {
            balances,
            ledger,
            locks,
            credits,
        }
    }

    /// Take a one-credit hold before billable work starts.
    ///
    /// Rejects with a `SessionConflict` if the session was ever reserved
    /// before; a session never re-enters the reserved state.
    #[instrument(skip(self))]
    pub async fn reserve(
        &self,
        user_id: &str,
        plan: AccountPlan,
        session_id: &str,
    ) -> AppResult<ReserveOutcome> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let history = self.ledger.for_session(session_id).await?;
        if history
            .iter()
            .any(|t| t.kind == TransactionKind::Reservation)
        {
            return Err(AppError::SessionConflict(format!(
                "session {} already holds or settled a reservation",
                session_id
            )));
        }

        let mut balance = self.balances.get(user_id, plan).await?;
        if !balance.reserve_one() {
            debug!(
                "Reservation refused for {}: {} credits available",
                user_id,
                balance.available()
            );
            return Ok(ReserveOutcome {
                reserved: false,
                available: balance.available(),
            });
        }

        self.balances.put(&balance).await?;
        if let Err(e) = self
            .ledger
            .append(NewTransaction::reservation(user_id, session_id))
            .await
        {
            // undo the hold so balance and ledger stay in step
            balance.release_one();
            let _ = self.balances.put(&balance).await;
            return Err(e);
        }

        audit::record(user_id, "credits.reserve", user_id, 1);
        Ok(ReserveOutcome {
            reserved: true,
            available: balance.available(),
        })
    }

    /// Settle the session's hold on completion/export of the record.
    ///
    /// Requires exactly one outstanding reservation; anything else is a
    /// caller bug (consuming without reserving, or consuming twice) and
    /// fails loudly without touching the balance.
    #[instrument(skip(self))]
    pub async fn consume(
        &self,
        user_id: &str,
        plan: AccountPlan,
        session_id: &str,
    ) -> AppResult<ConsumeOutcome> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let history = self.ledger.for_session(session_id).await?;
        if outstanding_reservations(&history) != 1 {
            warn!(
                "Consume without an outstanding reservation for session {}",
                session_id
            );
            return Err(AppError::SessionConflict(format!(
                "no outstanding reservation for session {}",
                session_id
            )));
        }

        let mut balance = self.balances.get(user_id, plan).await?;
        let previous = balance.clone();
        let pool = balance.settle_one().ok_or_else(|| {
            warn!("Both credit pools empty while settling session {}", session_id);
            AppError::SessionConflict(format!(
                "no credits left to settle session {}",
                session_id
            ))
        })?;

        self.balances.put(&balance).await?;
        if let Err(e) = self
            .ledger
            .append(NewTransaction::consumption(
                user_id,
                session_id,
                &pool.to_string(),
            ))
            .await
        {
            let _ = self.balances.put(&previous).await;
            return Err(e);
        }

        audit::record(user_id, "credits.consume", user_id, 1);
        Ok(ConsumeOutcome { pool, balance })
    }

    /// Drop the session's hold without consuming a credit.
    ///
    /// Deleting a draft that was never reserved is a safe no-op.
    #[instrument(skip(self))]
    pub async fn release(
        &self,
        user_id: &str,
        plan: AccountPlan,
        session_id: &str,
    ) -> AppResult<ReleaseOutcome> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let history = self.ledger.for_session(session_id).await?;
        if outstanding_reservations(&history) != 1 {
            debug!("Nothing to release for session {}", session_id);
            return Ok(ReleaseOutcome { released: false });
        }

        let mut balance = self.balances.get(user_id, plan).await?;
        let previous = balance.clone();
        if !balance.release_one() {
            return Ok(ReleaseOutcome { released: false });
        }

        self.balances.put(&balance).await?;
        if let Err(e) = self
            .ledger
            .append(NewTransaction::release(user_id, session_id))
            .await
        {
            let _ = self.balances.put(&previous).await;
            return Err(e);
        }

        audit::record(user_id, "credits.release", user_id, 1);
        Ok(ReleaseOutcome { released: true })
    }

    /// Reset the monthly allotment, driven by the external scheduler
    #[instrument(skip(self))]
    pub async fn reset_monthly(&self, user_id: &str, plan: AccountPlan) -> AppResult<CreditBalance> {
        let lock = self.locks.for_user(user_id);
        let _guard = lock.lock().await;

        let allotment = self.credits.allotment(plan);
        let mut balance = self.balances.get(user_id, plan).await?;
        balance.monthly_credits = allotment;
        balance.monthly_reset_at = chrono::Utc::now();

        self.balances.put(&balance).await?;
        if allotment > 0 {
            self.ledger
                .append(NewTransaction::monthly_allocation(user_id, allotment))
                .await?;
        }

        audit::record("scheduler", "credits.reset_monthly", user_id, allotment);
        Ok(balance)
    }

    /// Current balance (synthesized from the plan when none is stored)
    pub async fn balance(&self, user_id: &str, plan: AccountPlan) -> AppResult<CreditBalance> {
        self.balances.get(user_id, plan).await
    }

    /// Ledger entries, oldest first
    pub async fn transactions(
        &self,
        user_id: Option<&str>,
    ) -> AppResult<Vec<CreditTransaction>> {
        self.ledger.query(user_id).await
    }
}

/// Signed sum of reservation/release/consumption events for one session.
/// The ledger invariant keeps this at 0 or 1.
fn outstanding_reservations(history: &[CreditTransaction]) -> i32 {
    history
        .iter()
        .map(|t| match t.kind {
            TransactionKind::Reservation => 1,
            TransactionKind::Release | TransactionKind::Consumption => -1,
            _ => 0,
        })
        .sum()
}
