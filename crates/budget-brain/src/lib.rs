//! Budget tracking for the budget bot.
//!
//! The [`Ledger`] owns the account lifecycle: GitHub-gated registration,
//! monthly budgets, spend and the lazy month rollover. [`BudgetBrain`] parses
//! chat commands, runs them against the ledger and renders the replies.

pub mod brain;
pub mod clock;
pub mod command;
pub mod config;
pub mod ledger;
pub mod locks;
pub mod reply;

pub use brain::BudgetBrain;
pub use clock::{Clock, FixedClock, SystemClock};
pub use command::{Command, CommandKind, ParseError};
pub use config::BudgetBrainConfig;
pub use ledger::{
    AccountState, Balance, Ledger, LedgerError, Registration, Rollover, Spend, Turn,
};
pub use locks::{UserGuard, UserLocks};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
