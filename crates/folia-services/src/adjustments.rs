//! Administrator adjustment quota engine
//!
//! Authorizes and records administrator-granted top-ups subject to a hard
//! per-professional, per-calendar-month ceiling of
//! `floor(monthly_credits * cap_percent / 100)`, shared across every
//! administrator. The running total is recomputed from the live log at
//! decision time, under the recipient's lock, so two concurrent grants can
//! never both pass the check against a stale snapshot.

use crate::audit;
use crate::locks::UserLocks;
use chrono::{Datelike, Utc};
use folia_core::config::CreditsConfig;
use folia_core::models::{AccountPlan, AdminAdjustment, NewAdjustment, NewTransaction};
use folia_core::traits::{AdjustmentLog, BalanceStore, TransactionLedger};
use folia_core::{AppError, AppResult};
use std::sync::Arc;
use tracing::{instrument, warn};

/// A grant request from the administrative UI
#[derive(Debug, Clone)]
pub struct GrantRequest {
    pub admin_id: String,
    pub admin_name: String,
    pub user_id: String,
    pub user_name: String,
    pub plan: AccountPlan,
    pub amount: u32,
    pub reason: String,
}

/// Result of a successful grant
#[derive(Debug, Clone)]
pub struct GrantOutcome {
    pub adjustment: AdminAdjustment,
    /// Recipient's extra pool after the grant
    pub extra_credits: u32,
    /// What is left of this month's shared cap after the grant
    pub remaining: u32,
}

/// Shared monthly quota engine over the adjustment log and balance store
pub struct AdjustmentService {
    balances: Arc<dyn BalanceStore>,
    ledger: Arc<dyn TransactionLedger>,
    log: Arc<dyn AdjustmentLog>,
    locks: Arc<UserLocks>,
    credits: CreditsConfig,
}

impl AdjustmentService {
    pub fn new(
        balances: Arc<dyn BalanceStore>,
        ledger: Arc<dyn TransactionLedger>,
        log: Arc<dyn AdjustmentLog>,
        locks: Arc<UserLocks>,
        credits: CreditsConfig,
    ) -> Self {
        Self {
            balances,
            ledger,
            log,
            locks,
            credits,
        }
    }

    /// Grant extra credits to a professional.
    ///
    /// The adjustment record is made durable before the balance is touched;
    /// a grant is never applied without its audit record.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, amount = request.amount))]
    pub async fn grant(&self, request: GrantRequest) -> AppResult<GrantOutcome> {
        if request.amount == 0 {
            return Err(AppError::Validation(
                "amount must be a positive whole number of credits".to_string(),
            ));
        }
        let min_chars = self.credits.adjustment_reason_min_chars;
        if request.reason.trim().chars().count() < min_chars {
            return Err(AppError::Validation(format!(
                "reason must be at least {} characters",
                min_chars
            )));
        }

        let lock = self.locks.for_user(&request.user_id);
        let _guard = lock.lock().await;

        let mut balance = self.balances.get(&request.user_id, request.plan).await?;
        let remaining = self
            .remaining_for(&request.user_id, balance.monthly_credits)
            .await?;
        if request.amount > remaining {
            warn!(
                "Grant of {} to {} refused: {} credits remaining this month",
                request.amount, request.user_id, remaining
            );
            return Err(AppError::QuotaExceeded { remaining });
        }

        // Durable audit record first. If this fails the grant is not applied.
        let adjustment = self
            .log
            .append(NewAdjustment {
                user_id: request.user_id.clone(),
                user_name: request.user_name.clone(),
                amount: request.amount,
                reason: request.reason.trim().to_string(),
                admin_id: request.admin_id.clone(),
                admin_name: request.admin_name.clone(),
            })
            .await?;

        let previous = balance.clone();
        balance.add_extra(request.amount);
        self.balances.put(&balance).await?;

        if let Err(e) = self
            .ledger
            .append(NewTransaction::admin_grant(
                &request.user_id,
                request.amount,
                &request.admin_name,
            ))
            .await
        {
            // an orphaned adjustment entry only narrows the remaining
            // quota; the balance must not keep credits the ledger never saw
            let _ = self.balances.put(&previous).await;
            return Err(e);
        }

        audit::record(
            &request.admin_id,
            "credits.grant",
            &request.user_id,
            request.amount,
        );
        Ok(GrantOutcome {
            adjustment,
            extra_credits: balance.extra_credits,
            remaining: remaining - request.amount,
        })
    }

    /// What is left of the recipient's shared cap this month
    pub async fn remaining(&self, user_id: &str, plan: AccountPlan) -> AppResult<u32> {
        let balance = self.balances.get(user_id, plan).await?;
        self.remaining_for(user_id, balance.monthly_credits).await
    }

    /// Adjustment entries for audit display, oldest first
    pub async fn list(&self, user_id: Option<&str>) -> AppResult<Vec<AdminAdjustment>> {
        self.log.list(user_id).await
    }

    async fn remaining_for(&self, user_id: &str, monthly_credits: u32) -> AppResult<u32> {
        let cap = monthly_credits * self.credits.adjustment_cap_percent / 100;
        let now = Utc::now();
        let already_granted = self
            .log
            .granted_in_month(user_id, now.year(), now.month())
            .await?;
        Ok(cap.saturating_sub(already_granted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folia_store::{
        MemoryBackend, PersistentAdjustmentLog, PersistentBalanceStore,
        PersistentTransactionLedger, StorageBackend,
    };

    fn service_with_monthly(monthly: u32) -> AdjustmentService {
        let backend = Arc::new(MemoryBackend::new());
        let credits = CreditsConfig {
            standard_monthly_credits: monthly,
            ..CreditsConfig::default()
        };
        AdjustmentService::new(
            Arc::new(PersistentBalanceStore::new(backend.clone(), credits.clone())),
            Arc::new(PersistentTransactionLedger::new(backend.clone())),
            Arc::new(PersistentAdjustmentLog::new(
                backend,
                credits.adjustment_log_max_entries,
            )),
            Arc::new(UserLocks::new()),
            credits,
        )
    }

    fn request(admin: &str, amount: u32) -> GrantRequest {
        GrantRequest {
            admin_id: admin.to_string(),
            admin_name: format!("Admin {}", admin),
            user_id: "u1".to_string(),
            user_name: "Dr. Example".to_string(),
            plan: AccountPlan::Standard,
            amount,
            reason: "compensation for an interrupted record export".to_string(),
        }
    }

    #[tokio::test]
    async fn test_quota_is_shared_across_admins() {
        // monthly 200 -> cap 20
        let service = service_with_monthly(200);

        let first = service.grant(request("a", 12)).await.unwrap();
        assert_eq!(first.remaining, 8);

        let err = service.grant(request("b", 10)).await.unwrap_err();
        match err {
            AppError::QuotaExceeded { remaining } => assert_eq!(remaining, 8),
            other => panic!("expected QuotaExceeded, got {:?}", other),
        }

        let ok = service.grant(request("b", 8)).await.unwrap();
        assert_eq!(ok.remaining, 0);
        assert_eq!(ok.extra_credits, 20);
    }

    #[tokio::test]
    async fn test_cap_is_floored() {
        // monthly 25 -> floor(2.5) = 2
        let service = service_with_monthly(25);
        assert_eq!(
            service.remaining("u1", AccountPlan::Standard).await.unwrap(),
            2
        );
        let err = service.grant(request("a", 3)).await.unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded { remaining: 2 }));
    }

    #[tokio::test]
    async fn test_short_reason_is_rejected() {
        let service = service_with_monthly(200);
        let mut req = request("a", 5);
        req.reason = "too short".to_string();
        let err = service.grant(req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(service.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_amount_is_rejected() {
        let service = service_with_monthly(200);
        let err = service.grant(request("a", 0)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_grant_writes_log_balance_and_ledger() {
        let service = service_with_monthly(200);
        service.grant(request("a", 10)).await.unwrap();

        let adjustments = service.list(Some("u1")).await.unwrap();
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].amount, 10);

        let balance = service
            .balances
            .get("u1", AccountPlan::Standard)
            .await
            .unwrap();
        assert_eq!(balance.extra_credits, 10);

        let ledger = service.ledger.query(Some("u1")).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(
            ledger[0].kind,
            folia_core::models::TransactionKind::Purchase
        );
        assert_eq!(ledger[0].amount, 10);
    }

    #[tokio::test]
    async fn test_corrupted_log_does_not_block_grants() {
        let backend = Arc::new(MemoryBackend::new());
        let credits = CreditsConfig {
            standard_monthly_credits: 200,
            ..CreditsConfig::default()
        };
        backend.write("adjustments", "!! not json !!").unwrap();

        let service = AdjustmentService::new(
            Arc::new(PersistentBalanceStore::new(backend.clone(), credits.clone())),
            Arc::new(PersistentTransactionLedger::new(backend.clone())),
            Arc::new(PersistentAdjustmentLog::new(
                backend,
                credits.adjustment_log_max_entries,
            )),
            Arc::new(UserLocks::new()),
            credits,
        );

        // behaves as if the log were empty: the full cap is available
        let outcome = service.grant(request("a", 20)).await.unwrap();
        assert_eq!(outcome.remaining, 0);
    }

    #[tokio::test]
    async fn test_unrecordable_grant_leaves_balance_untouched() {
        // backend too small for any adjustment document
        let backend = Arc::new(MemoryBackend::new());
        let credits = CreditsConfig {
            standard_monthly_credits: 200,
            ..CreditsConfig::default()
        };
        let balances = Arc::new(PersistentBalanceStore::new(backend.clone(), credits.clone()));
        let tiny = Arc::new(MemoryBackend::with_capacity(16));
        let service = AdjustmentService::new(
            balances.clone(),
            Arc::new(PersistentTransactionLedger::new(backend)),
            Arc::new(PersistentAdjustmentLog::new(tiny, 10)),
            Arc::new(UserLocks::new()),
            credits,
        );

        let err = service.grant(request("a", 5)).await.unwrap_err();
        assert!(matches!(err, AppError::AdjustmentNotRecorded(_)));

        let balance = balances.get("u1", AccountPlan::Standard).await.unwrap();
        assert_eq!(balance.extra_credits, 0);
    }
}
