//! End-to-end credit lifecycle tests against the persistent stores,
//! including the concurrency guarantees of the per-professional locks.

use std::sync::Arc;

use folia_core::config::CreditsConfig;
use folia_core::models::{AccountPlan, TransactionKind};
use folia_services::{AdjustmentService, CreditService, FolioSequence, GrantRequest, UserLocks};
use folia_store::{
    MemoryBackend, PersistentAdjustmentLog, PersistentBalanceStore, PersistentFolioCounters,
    PersistentTransactionLedger,
};

struct Harness {
    credits: CreditService,
    adjustments: AdjustmentService,
    folios: FolioSequence,
}

fn harness(standard_monthly: u32) -> Harness {
    let backend = Arc::new(MemoryBackend::new());
    let config = CreditsConfig {
        standard_monthly_credits: standard_monthly,
        ..CreditsConfig::default()
    };
    let balances = Arc::new(PersistentBalanceStore::new(backend.clone(), config.clone()));
    let ledger = Arc::new(PersistentTransactionLedger::new(backend.clone()));
    let log = Arc::new(PersistentAdjustmentLog::new(
        backend.clone(),
        config.adjustment_log_max_entries,
    ));
    let locks = Arc::new(UserLocks::new());

    Harness {
        credits: CreditService::new(
            balances.clone(),
            ledger.clone(),
            locks.clone(),
            config.clone(),
        ),
        adjustments: AdjustmentService::new(balances, ledger, log, locks, config),
        folios: FolioSequence::new(Arc::new(PersistentFolioCounters::new(backend))),
    }
}

fn grant(admin: &str, user: &str, amount: u32) -> GrantRequest {
    GrantRequest {
        admin_id: admin.to_string(),
        admin_name: format!("Admin {}", admin),
        user_id: user.to_string(),
        user_name: "Dr. Example".to_string(),
        plan: AccountPlan::Standard,
        amount,
        reason: "support compensation after a failed record export".to_string(),
    }
}

#[tokio::test]
async fn concurrent_reservations_never_overdraw() {
    let h = Arc::new(harness(1));

    let mut handles = Vec::new();
    for i in 0..8 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            h.credits
                .reserve("u1", AccountPlan::Standard, &format!("s{}", i))
                .await
                .unwrap()
        }));
    }

    let mut granted = 0;
    for handle in handles {
        if handle.await.unwrap().reserved {
            granted += 1;
        }
    }
    assert_eq!(granted, 1);

    let balance = h
        .credits
        .balance("u1", AccountPlan::Standard)
        .await
        .unwrap();
    assert_eq!(balance.reserved_credits, 1);
    assert_eq!(balance.available(), 0);
}

#[tokio::test]
async fn concurrent_grants_respect_the_shared_cap() {
    // monthly 200 -> cap 20; ten admins racing with 12 each, one wins
    let h = Arc::new(harness(200));

    let mut handles = Vec::new();
    for i in 0..10 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            h.adjustments
                .grant(grant(&format!("a{}", i), "u1", 12))
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 1);

    let balance = h
        .credits
        .balance("u1", AccountPlan::Standard)
        .await
        .unwrap();
    assert_eq!(balance.extra_credits, 12);
}

#[tokio::test]
async fn grant_then_spend_extra_credits() {
    let h = harness(1);

    h.adjustments.grant(grant("a", "u1", 5)).await.unwrap();

    // two consumptions: the first drains the monthly pool, the second the
    // granted extras
    for session in ["s1", "s2"] {
        let outcome = h
            .credits
            .reserve("u1", AccountPlan::Standard, session)
            .await
            .unwrap();
        assert!(outcome.reserved);
        h.credits
            .consume("u1", AccountPlan::Standard, session)
            .await
            .unwrap();
    }

    let balance = h
        .credits
        .balance("u1", AccountPlan::Standard)
        .await
        .unwrap();
    assert_eq!(balance.monthly_credits, 0);
    assert_eq!(balance.extra_credits, 4);

    let ledger = h.credits.transactions(Some("u1")).await.unwrap();
    let kinds: Vec<TransactionKind> = ledger.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TransactionKind::Purchase,
            TransactionKind::Reservation,
            TransactionKind::Consumption,
            TransactionKind::Reservation,
            TransactionKind::Consumption,
        ]
    );
}

#[tokio::test]
async fn ledger_reservation_release_pairs_balance_out() {
    let h = harness(10);

    h.credits
        .reserve("u1", AccountPlan::Standard, "s1")
        .await
        .unwrap();
    h.credits
        .release("u1", AccountPlan::Standard, "s1")
        .await
        .unwrap();
    // releasing again stays a no-op and writes nothing
    let again = h
        .credits
        .release("u1", AccountPlan::Standard, "s1")
        .await
        .unwrap();
    assert!(!again.released);

    let entries = h.credits.transactions(Some("u1")).await.unwrap();
    let reservations = entries
        .iter()
        .filter(|t| t.kind == TransactionKind::Reservation)
        .count();
    let releases = entries
        .iter()
        .filter(|t| t.kind == TransactionKind::Release)
        .count();
    assert_eq!(reservations, 1);
    assert_eq!(releases, 1);
}

#[tokio::test]
async fn operations_on_different_users_are_independent() {
    let h = Arc::new(harness(1));

    let mut handles = Vec::new();
    for user in ["u1", "u2", "u3", "u4"] {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            let outcome = h
                .credits
                .reserve(user, AccountPlan::Standard, &format!("{}-s", user))
                .await
                .unwrap();
            assert!(outcome.reserved);
            h.credits
                .consume(user, AccountPlan::Standard, &format!("{}-s", user))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for user in ["u1", "u2", "u3", "u4"] {
        let balance = h.credits.balance(user, AccountPlan::Standard).await.unwrap();
        assert_eq!(balance.monthly_credits, 0);
        assert_eq!(balance.reserved_credits, 0);
    }
}

#[tokio::test]
async fn concurrent_folios_are_unique() {
    let h = Arc::new(harness(10));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let h = h.clone();
        handles.push(tokio::spawn(async move { h.folios.next("lima").await.unwrap() }));
    }

    let mut folios = Vec::new();
    for handle in handles {
        folios.push(handle.await.unwrap());
    }
    folios.sort();
    folios.dedup();
    assert_eq!(folios.len(), 16);
}
