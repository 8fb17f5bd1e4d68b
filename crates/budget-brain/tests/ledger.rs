//! Ledger behaviour against an in-memory database.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use budget_brain::{AccountState, FixedClock, Ledger, LedgerError, Rollover};
use database::{account, BudgetPeriod, Database};
use github_stars::{EndorserSource, GithubError};
use rust_decimal::Decimal;

const REPO_URL: &str = "https://github.com/owner/budgetbot";

struct StaticEndorsers {
    handles: Vec<String>,
    fetches: AtomicUsize,
}

impl StaticEndorsers {
    fn new(handles: &[&str]) -> Self {
        Self {
            handles: handles.iter().map(|h| h.to_string()).collect(),
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EndorserSource for StaticEndorsers {
    async fn fetch_endorsers(&self) -> Result<Vec<String>, GithubError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.handles.clone())
    }

    fn endorsement_url(&self) -> String {
        REPO_URL.to_string()
    }
}

struct UnreachableGithub;

#[async_trait]
impl EndorserSource for UnreachableGithub {
    async fn fetch_endorsers(&self) -> Result<Vec<String>, GithubError> {
        Err(GithubError::Status {
            status: 503,
            body: "unavailable".to_string(),
        })
    }

    fn endorsement_url(&self) -> String {
        REPO_URL.to_string()
    }
}

struct HangingGithub;

#[async_trait]
impl EndorserSource for HangingGithub {
    async fn fetch_endorsers(&self) -> Result<Vec<String>, GithubError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec!["alice".to_string()])
    }

    fn endorsement_url(&self) -> String {
        REPO_URL.to_string()
    }
}

fn period(s: &str) -> BudgetPeriod {
    s.parse().unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct Harness {
    ledger: Ledger,
    clock: Arc<FixedClock>,
    endorsers: Arc<StaticEndorsers>,
    db: Database,
}

async fn harness(handles: &[&str], start: &str) -> Harness {
    let db = Database::in_memory().await.unwrap();
    let clock = Arc::new(FixedClock::at_period(period(start)));
    let endorsers = Arc::new(StaticEndorsers::new(handles));
    let ledger = Ledger::new(db.clone(), endorsers.clone(), clock.clone());
    Harness {
        ledger,
        clock,
        endorsers,
        db,
    }
}

/// Register `user_id` and give it `budget` with `spent` already recorded.
async fn budgeted_account(h: &Harness, user_id: i64, handle: &str, budget: &str, spent: &str) {
    h.ledger.register(user_id, handle).await.unwrap();
    let mut turn = h.ledger.begin_turn(user_id).await.unwrap();
    h.ledger.set_budget(&mut turn, dec(budget)).await.unwrap();
    if dec(spent) > Decimal::ZERO {
        h.ledger.record_spend(&mut turn, dec(spent)).await.unwrap();
    }
}

#[tokio::test]
async fn test_register_creates_account_without_budget() {
    let h = harness(&["Alice", "bob"], "2024-05").await;
    assert_eq!(h.ledger.state(1).await.unwrap(), AccountState::Unregistered);

    let registration = h.ledger.register(1, "alice").await.unwrap();
    assert_eq!(registration.account.github_login, "alice");
    assert_eq!(registration.account.budget_period, period("2024-05"));
    assert!(registration.previous_handle.is_none());

    assert_eq!(
        h.ledger.state(1).await.unwrap(),
        AccountState::Registered { budgeted: false }
    );
}

#[tokio::test]
async fn test_register_matches_endorsers_case_insensitively() {
    let h = harness(&["Alice", "bob"], "2024-05").await;

    assert!(h.ledger.register(1, "ALICE").await.is_ok());

    match h.ledger.register(2, "carol").await {
        Err(LedgerError::NotEndorsed {
            handle,
            endorsement_url,
        }) => {
            assert_eq!(handle, "carol");
            assert_eq!(endorsement_url, REPO_URL);
        }
        other => panic!("expected NotEndorsed, got {:?}", other),
    }
    assert_eq!(h.ledger.state(2).await.unwrap(), AccountState::Unregistered);
}

#[tokio::test]
async fn test_register_rejects_handle_taken_by_another_user() {
    let h = harness(&["Alice", "bob"], "2024-05").await;
    h.ledger.register(1, "Alice").await.unwrap();

    let err = h.ledger.register(2, "alice").await.unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyRegistered { .. }));
    assert_eq!(h.ledger.state(2).await.unwrap(), AccountState::Unregistered);

    // Taken handles are refused before GitHub is asked.
    assert_eq!(h.endorsers.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_reregister_overwrites_handle_and_keeps_budget() {
    let h = harness(&["Alice", "bob"], "2024-05").await;
    budgeted_account(&h, 1, "Alice", "100", "20").await;

    let registration = h.ledger.register(1, "bob").await.unwrap();
    assert_eq!(registration.previous_handle.as_deref(), Some("Alice"));
    assert_eq!(registration.account.github_login, "bob");
    assert_eq!(registration.account.monthly_budget, dec("100"));
    assert_eq!(registration.account.spent, dec("20"));

    // The old handle is free again.
    assert!(h.ledger.register(2, "alice").await.is_ok());
}

#[tokio::test]
async fn test_reregister_with_own_handle_is_accepted() {
    let h = harness(&["Alice"], "2024-05").await;
    h.ledger.register(1, "Alice").await.unwrap();

    let registration = h.ledger.register(1, "alice").await.unwrap();
    assert!(registration.previous_handle.is_none());
    assert_eq!(registration.account.github_login, "alice");
    assert_eq!(account::count_accounts(h.db.pool()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_endorsers_are_fetched_on_every_registration() {
    let h = harness(&["Alice", "bob"], "2024-05").await;
    h.ledger.register(1, "Alice").await.unwrap();
    h.ledger.register(2, "bob").await.unwrap();
    let _ = h.ledger.register(3, "carol").await;
    assert_eq!(h.endorsers.fetches.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_github_failure_is_external_check_failed() {
    let db = Database::in_memory().await.unwrap();
    let clock = Arc::new(FixedClock::at_period(period("2024-05")));
    let ledger = Ledger::new(db, Arc::new(UnreachableGithub), clock);

    let err = ledger.register(1, "alice").await.unwrap_err();
    assert!(matches!(err, LedgerError::ExternalCheckFailed(_)));
    assert_eq!(ledger.state(1).await.unwrap(), AccountState::Unregistered);
}

#[tokio::test]
async fn test_slow_github_is_cut_off() {
    let db = Database::in_memory().await.unwrap();
    let clock = Arc::new(FixedClock::at_period(period("2024-05")));
    let ledger = Ledger::new(db, Arc::new(HangingGithub), clock)
        .with_check_timeout(Duration::from_millis(50));

    let err = tokio::time::timeout(Duration::from_secs(2), ledger.register(1, "alice"))
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ExternalCheckFailed(GithubError::Timeout(_))
    ));
    assert_eq!(ledger.state(1).await.unwrap(), AccountState::Unregistered);
}

#[tokio::test]
async fn test_commands_require_registration() {
    let h = harness(&["Alice"], "2024-05").await;
    let err = h.ledger.begin_turn(42).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotRegistered(42)));
}

#[tokio::test]
async fn test_set_budget_rejects_non_positive_amounts() {
    let h = harness(&["Alice"], "2024-05").await;
    h.ledger.register(1, "Alice").await.unwrap();
    let mut turn = h.ledger.begin_turn(1).await.unwrap();

    for amount in ["-5", "0"] {
        let err = h.ledger.set_budget(&mut turn, dec(amount)).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)), "{}", amount);
    }

    let stored = account::get_account(h.db.pool(), 1).await.unwrap().unwrap();
    assert_eq!(stored.monthly_budget, Decimal::ZERO);
}

#[tokio::test]
async fn test_set_budget_keeps_spent() {
    let h = harness(&["Alice"], "2024-05").await;
    budgeted_account(&h, 1, "Alice", "100", "40").await;

    let mut turn = h.ledger.begin_turn(1).await.unwrap();
    h.ledger.set_budget(&mut turn, dec("250.50")).await.unwrap();

    let stored = account::get_account(h.db.pool(), 1).await.unwrap().unwrap();
    assert_eq!(stored.monthly_budget, dec("250.50"));
    assert_eq!(stored.spent, dec("40"));
    assert_eq!(stored.budget_period, period("2024-05"));
    assert_eq!(
        h.ledger.state(1).await.unwrap(),
        AccountState::Registered { budgeted: true }
    );
}

#[tokio::test]
async fn test_record_spend_adds_exactly() {
    let h = harness(&["Alice"], "2024-05").await;
    budgeted_account(&h, 1, "Alice", "100", "0").await;

    let mut turn = h.ledger.begin_turn(1).await.unwrap();
    h.ledger.record_spend(&mut turn, dec("0.1")).await.unwrap();
    let spend = h.ledger.record_spend(&mut turn, dec("0.2")).await.unwrap();
    assert_eq!(spend.spent, dec("0.3"));
    assert!(spend.overage.is_none());

    let stored = account::get_account(h.db.pool(), 1).await.unwrap().unwrap();
    assert_eq!(stored.spent, dec("0.3"));
}

#[tokio::test]
async fn test_record_spend_over_budget_warns_but_succeeds() {
    let h = harness(&["Alice"], "2024-05").await;
    budgeted_account(&h, 1, "Alice", "100", "20").await;

    let mut turn = h.ledger.begin_turn(1).await.unwrap();
    let spend = h.ledger.record_spend(&mut turn, dec("90")).await.unwrap();
    assert_eq!(spend.spent, dec("110"));
    assert_eq!(spend.overage, Some(dec("10")));

    let stored = account::get_account(h.db.pool(), 1).await.unwrap().unwrap();
    assert_eq!(stored.spent, dec("110"));
}

#[tokio::test]
async fn test_record_spend_ignores_overage_below_a_cent() {
    let h = harness(&["Alice"], "2024-05").await;
    budgeted_account(&h, 1, "Alice", "100", "0").await;

    let mut turn = h.ledger.begin_turn(1).await.unwrap();
    let spend = h.ledger.record_spend(&mut turn, dec("100.001")).await.unwrap();
    assert_eq!(spend.spent, dec("100.001"));
    assert!(spend.overage.is_none());

    let spend = h.ledger.record_spend(&mut turn, dec("0.004")).await.unwrap();
    assert_eq!(spend.overage, Some(dec("0.01")));
}

#[tokio::test]
async fn test_record_spend_rejects_non_positive_amounts() {
    let h = harness(&["Alice"], "2024-05").await;
    budgeted_account(&h, 1, "Alice", "100", "20").await;

    let mut turn = h.ledger.begin_turn(1).await.unwrap();
    let err = h.ledger.record_spend(&mut turn, dec("-3")).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    let stored = account::get_account(h.db.pool(), 1).await.unwrap().unwrap();
    assert_eq!(stored.spent, dec("20"));
}

#[tokio::test]
async fn test_first_spend_in_new_month_rolls_over_first() {
    let h = harness(&["Alice"], "2024-05").await;
    budgeted_account(&h, 1, "Alice", "100", "80").await;

    h.clock.set_period(period("2024-06"));

    let mut turn = h.ledger.begin_turn(1).await.unwrap();
    assert_eq!(
        turn.rollover(),
        Rollover::Started {
            previous: period("2024-05")
        }
    );
    let spend = h.ledger.record_spend(&mut turn, dec("30")).await.unwrap();
    assert_eq!(spend.spent, dec("30"));
    assert!(spend.overage.is_none());

    let stored = account::get_account(h.db.pool(), 1).await.unwrap().unwrap();
    assert_eq!(stored.spent, dec("30"));
    assert_eq!(stored.monthly_budget, dec("100"));
    assert_eq!(stored.budget_period, period("2024-06"));
}

#[tokio::test]
async fn test_rollover_is_idempotent() {
    let h = harness(&["Alice"], "2024-05").await;
    budgeted_account(&h, 1, "Alice", "100", "80").await;
    h.clock.set_period(period("2024-06"));

    let mut account = account::get_account(h.db.pool(), 1).await.unwrap().unwrap();
    let first = h.ledger.rollover_if_needed(&mut account).await.unwrap();
    assert!(first.started());
    assert_eq!(account.spent, Decimal::ZERO);

    let second = h.ledger.rollover_if_needed(&mut account).await.unwrap();
    assert_eq!(second, Rollover::Current);

    // A later turn in the same month sees no rollover either.
    let turn = h.ledger.begin_turn(1).await.unwrap();
    assert_eq!(turn.rollover(), Rollover::Current);
}

#[tokio::test]
async fn test_rollover_skips_months_without_activity() {
    let h = harness(&["Alice"], "2024-05").await;
    budgeted_account(&h, 1, "Alice", "100", "80").await;
    h.clock.set_period(period("2024-09"));

    let turn = h.ledger.begin_turn(1).await.unwrap();
    assert_eq!(
        turn.rollover(),
        Rollover::Started {
            previous: period("2024-05")
        }
    );
    assert_eq!(turn.period(), period("2024-09"));

    let balance = h.ledger.balance(&turn);
    assert_eq!(balance.spent, Decimal::ZERO);
    assert_eq!(balance.remaining, dec("100"));
}

#[tokio::test]
async fn test_reset_spent_zeroes_spend_and_keeps_budget() {
    let h = harness(&["Alice"], "2024-05").await;
    budgeted_account(&h, 1, "Alice", "100", "75.25").await;

    let mut turn = h.ledger.begin_turn(1).await.unwrap();
    h.ledger.reset_spent(&mut turn).await.unwrap();

    let stored = account::get_account(h.db.pool(), 1).await.unwrap().unwrap();
    assert_eq!(stored.spent, Decimal::ZERO);
    assert_eq!(stored.monthly_budget, dec("100"));
}

#[tokio::test]
async fn test_reset_spent_without_budget_fails() {
    let h = harness(&["Alice"], "2024-05").await;
    h.ledger.register(1, "Alice").await.unwrap();

    let mut turn = h.ledger.begin_turn(1).await.unwrap();
    let err = h.ledger.reset_spent(&mut turn).await.unwrap_err();
    assert!(matches!(err, LedgerError::NoActiveBudget(p) if p == period("2024-05")));
}

#[tokio::test]
async fn test_balance_reports_remaining() {
    let h = harness(&["Alice"], "2024-05").await;
    budgeted_account(&h, 1, "Alice", "100", "120").await;

    let turn = h.ledger.begin_turn(1).await.unwrap();
    let balance = h.ledger.balance(&turn);
    assert_eq!(balance.budget, dec("100"));
    assert_eq!(balance.spent, dec("120"));
    assert_eq!(balance.remaining, dec("-20"));
    assert_eq!(balance.period, period("2024-05"));
}

#[tokio::test]
async fn test_fractional_budget_balance() {
    let h = harness(&["Alice"], "2024-05").await;
    budgeted_account(&h, 1, "Alice", "40", "20").await;

    let mut turn = h.ledger.begin_turn(1).await.unwrap();
    h.ledger.set_budget(&mut turn, dec("100.5")).await.unwrap();

    let turn = h.ledger.begin_turn(1).await.unwrap();
    let balance = h.ledger.balance(&turn);
    assert_eq!(balance.budget, dec("100.5"));
    assert_eq!(balance.spent, dec("20"));
    assert_eq!(balance.remaining, dec("80.5"));
}

#[tokio::test]
async fn test_store_failure_is_reported() {
    let h = harness(&["Alice"], "2024-05").await;
    h.db.close().await;

    let err = h.ledger.begin_turn(1).await.unwrap_err();
    assert!(matches!(err, LedgerError::Store(_)));
}
