//! Account lifecycle: registration, budgets, spend and month rollover.

use std::sync::Arc;
use std::time::Duration;

use database::{account, Account, BudgetPeriod, Database, DatabaseError};
use github_stars::{is_endorser, EndorserSource, GithubError};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tracing::{debug, info};

use crate::clock::Clock;

/// How long registration waits for the endorser list.
///
/// Must stay below the message processor's brain timeout, otherwise the
/// user gets no reply at all.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("user {0} is not registered")]
    NotRegistered(i64),

    #[error("GitHub user {handle} is already registered")]
    AlreadyRegistered { handle: String },

    #[error("GitHub user {handle} has not starred the repository")]
    NotEndorsed { handle: String, endorsement_url: String },

    #[error("endorser check failed: {0}")]
    ExternalCheckFailed(#[source] GithubError),

    #[error("invalid amount {0}, must be positive")]
    InvalidAmount(Decimal),

    #[error("no active budget for {0}")]
    NoActiveBudget(BudgetPeriod),

    #[error("store failure: {0}")]
    Store(#[from] DatabaseError),
}

/// Registration state, derived from the stored record and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    Unregistered,
    Registered { budgeted: bool },
}

impl AccountState {
    pub fn of(account: Option<&Account>) -> Self {
        match account {
            None => AccountState::Unregistered,
            Some(account) => AccountState::Registered {
                budgeted: account.has_budget(),
            },
        }
    }
}

/// Outcome of the month rollover check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollover {
    /// The account was already in the current period.
    Current,
    /// A new period started; spend was zeroed.
    Started { previous: BudgetPeriod },
}

impl Rollover {
    pub fn started(&self) -> bool {
        matches!(self, Rollover::Started { .. })
    }
}

/// One command's view of an account, after the rollover check has run.
#[derive(Debug, Clone)]
pub struct Turn {
    account: Account,
    rollover: Rollover,
    period: BudgetPeriod,
}

impl Turn {
    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn rollover(&self) -> Rollover {
        self.rollover
    }

    /// The period this turn runs in.
    pub fn period(&self) -> BudgetPeriod {
        self.period
    }
}

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub account: Account,
    /// Set when an existing account switched to a different GitHub login.
    pub previous_handle: Option<String>,
}

/// Result of recording an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spend {
    pub spent: Decimal,
    pub budget: Decimal,
    /// How far spend now exceeds the budget, if it does by at least a cent
    /// once rounded.
    pub overage: Option<Decimal>,
}

/// Budget position for the current period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub budget: Decimal,
    pub spent: Decimal,
    /// `budget - spent`; negative when overspent.
    pub remaining: Decimal,
    pub period: BudgetPeriod,
}

/// Applies commands to accounts in the store.
#[derive(Clone)]
pub struct Ledger {
    db: Database,
    endorsers: Arc<dyn EndorserSource>,
    clock: Arc<dyn Clock>,
    check_timeout: Duration,
}

impl Ledger {
    pub fn new(db: Database, endorsers: Arc<dyn EndorserSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            endorsers,
            clock,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    /// Bound the endorser lookup made by [`Ledger::register`].
    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn current_period(&self) -> BudgetPeriod {
        self.clock.current_period()
    }

    /// Where users go to become eligible for registration.
    pub fn endorsement_url(&self) -> String {
        self.endorsers.endorsement_url()
    }

    /// Look up a user's registration state.
    pub async fn state(&self, user_id: i64) -> Result<AccountState, LedgerError> {
        let account = account::get_account(self.db.pool(), user_id).await?;
        Ok(AccountState::of(account.as_ref()))
    }

    /// Register `user_id` under a GitHub login that has starred the repository.
    ///
    /// Re-registering replaces the account's login; budget and spend are kept.
    pub async fn register(&self, user_id: i64, handle: &str) -> Result<Registration, LedgerError> {
        let handle = handle.trim();
        let pool = self.db.pool();

        if let Some(owner) = account::handle_owner(pool, handle).await? {
            if owner != user_id {
                return Err(LedgerError::AlreadyRegistered {
                    handle: handle.to_string(),
                });
            }
        }

        let endorsers = tokio::time::timeout(self.check_timeout, self.endorsers.fetch_endorsers())
            .await
            .map_err(|_| GithubError::Timeout(self.check_timeout))
            .and_then(|fetched| fetched)
            .map_err(LedgerError::ExternalCheckFailed)?;
        if !is_endorser(handle, &endorsers) {
            return Err(LedgerError::NotEndorsed {
                handle: handle.to_string(),
                endorsement_url: self.endorsers.endorsement_url(),
            });
        }

        let existing = account::get_account(pool, user_id).await?;

        account::upsert_on_register(pool, user_id, handle, self.current_period())
            .await
            .map_err(|e| match e {
                DatabaseError::AlreadyExists { .. } => LedgerError::AlreadyRegistered {
                    handle: handle.to_string(),
                },
                other => LedgerError::Store(other),
            })?;

        let account = self.load(user_id).await?;
        let previous_handle = existing
            .map(|a| a.github_login)
            .filter(|previous| !previous.eq_ignore_ascii_case(&account.github_login));

        info!(
            "Registered user {} as GitHub user {}{}",
            user_id,
            account.github_login,
            previous_handle
                .as_deref()
                .map(|p| format!(" (was {})", p))
                .unwrap_or_default()
        );

        Ok(Registration {
            account,
            previous_handle,
        })
    }

    /// Load a registered account and bring it into the current period.
    ///
    /// Every account command starts here, so the rollover check runs exactly
    /// once per command and its write lands before anything reads `spent`.
    pub async fn begin_turn(&self, user_id: i64) -> Result<Turn, LedgerError> {
        let mut account = self.load(user_id).await?;
        let rollover = self.rollover_if_needed(&mut account).await?;
        Ok(Turn {
            period: account.budget_period,
            account,
            rollover,
        })
    }

    /// Zero spend and move to the current period if the month has changed.
    ///
    /// The monthly budget carries over.
    pub async fn rollover_if_needed(&self, account: &mut Account) -> Result<Rollover, LedgerError> {
        let current = self.current_period();
        if account.budget_period == current {
            return Ok(Rollover::Current);
        }

        account::start_period(self.db.pool(), account.user_id, current).await?;

        let previous = account.budget_period;
        account.spent = Decimal::ZERO;
        account.budget_period = current;

        info!(
            "New budget period for user {}: {} -> {}",
            account.user_id, previous, current
        );
        Ok(Rollover::Started { previous })
    }

    /// Set the monthly budget. Spend recorded so far is kept.
    pub async fn set_budget(&self, turn: &mut Turn, amount: Decimal) -> Result<(), LedgerError> {
        ensure_positive(amount)?;
        let period = self.current_period();

        account::set_budget_fields(self.db.pool(), turn.account.user_id, amount, period).await?;

        turn.account.monthly_budget = amount;
        turn.account.budget_period = period;
        turn.period = period;
        debug!(
            "User {} set budget {} for {}",
            turn.account.user_id, amount, period
        );
        Ok(())
    }

    /// Add an expense. Going over budget is reported but never refused.
    pub async fn record_spend(&self, turn: &mut Turn, amount: Decimal) -> Result<Spend, LedgerError> {
        ensure_positive(amount)?;
        let spent = turn
            .account
            .spent
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount(amount))?;

        account::set_spent(self.db.pool(), turn.account.user_id, spent).await?;
        turn.account.spent = spent;

        let budget = turn.account.monthly_budget;
        let overage = Some(round_cents(spent - budget)).filter(|o| *o > Decimal::ZERO);
        debug!(
            "User {} spent {} ({} of {})",
            turn.account.user_id, amount, spent, budget
        );

        Ok(Spend {
            spent,
            budget,
            overage,
        })
    }

    /// Zero this month's spend. Requires a budget set for the current period.
    pub async fn reset_spent(&self, turn: &mut Turn) -> Result<(), LedgerError> {
        let current = self.current_period();
        if !turn.account.has_budget() || turn.account.budget_period != current {
            return Err(LedgerError::NoActiveBudget(current));
        }

        account::set_spent(self.db.pool(), turn.account.user_id, Decimal::ZERO).await?;
        turn.account.spent = Decimal::ZERO;
        debug!("User {} reset spend for {}", turn.account.user_id, current);
        Ok(())
    }

    /// Budget left in the turn's period.
    pub fn balance(&self, turn: &Turn) -> Balance {
        Balance {
            budget: turn.account.monthly_budget,
            spent: turn.account.spent,
            remaining: turn.account.remaining(),
            period: turn.account.budget_period,
        }
    }

    async fn load(&self, user_id: i64) -> Result<Account, LedgerError> {
        account::get_account(self.db.pool(), user_id)
            .await?
            .ok_or(LedgerError::NotRegistered(user_id))
    }
}

/// Round to two places, half away from zero, as amounts are shown.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn ensure_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}
