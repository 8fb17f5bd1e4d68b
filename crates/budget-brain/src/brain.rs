//! BudgetBrain implementation.

use std::sync::Arc;

use brain_core::{async_trait, Brain, BrainError, InboundMessage, OutboundMessage};
use database::Database;
use github_stars::EndorserSource;
use tracing::{debug, error, info};

use crate::command::{Command, CommandKind};
use crate::config::BudgetBrainConfig;
use crate::ledger::{Ledger, LedgerError, Rollover};
use crate::locks::UserLocks;
use crate::reply;

/// Routes budget commands to the ledger and renders the replies.
#[derive(Clone)]
pub struct BudgetBrain {
    ledger: Ledger,
    locks: UserLocks,
    issues_url: Option<String>,
}

impl BudgetBrain {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            locks: UserLocks::new(),
            issues_url: None,
        }
    }

    /// Show `url` in the help text as the place to report problems.
    pub fn with_issues_url(mut self, url: impl Into<String>) -> Self {
        self.issues_url = Some(url.into());
        self
    }

    /// Open the database, run migrations and build the brain.
    pub async fn connect(
        config: BudgetBrainConfig,
        endorsers: Arc<dyn EndorserSource>,
    ) -> Result<Self, BrainError> {
        let db = Database::connect(&config.sqlite_url)
            .await
            .map_err(|e| BrainError::Configuration(format!("db connect failed: {}", e)))?;
        db.migrate()
            .await
            .map_err(|e| BrainError::Configuration(format!("db migrate failed: {}", e)))?;

        let ledger = Ledger::new(db, endorsers, config.clock());
        info!("Budget period is {}", ledger.current_period());

        Ok(Self {
            ledger,
            locks: UserLocks::new(),
            issues_url: config.issues_url,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// `(command, description)` pairs for the bot's command menu.
    pub fn command_menu() -> Vec<(&'static str, &'static str)> {
        CommandKind::ALL
            .iter()
            .map(|kind| (kind.name(), kind.description()))
            .collect()
    }

    async fn handle(
        &self,
        user_id: i64,
        command: &Command,
        out: &mut OutboundMessage,
    ) -> Result<(), LedgerError> {
        if !command.needs_account() {
            return self.handle_without_account(user_id, command, out).await;
        }

        let mut turn = self.ledger.begin_turn(user_id).await?;
        if let Rollover::Started { .. } = turn.rollover() {
            out.push(reply::rollover_notice(turn.period()));
        }

        match command {
            Command::SetBudget { amount } => {
                self.ledger.set_budget(&mut turn, *amount).await?;
                out.push(reply::budget_set(*amount, turn.period()));
            }
            Command::Spend { amount } => {
                let spend = self.ledger.record_spend(&mut turn, *amount).await?;
                if let Some(overage) = spend.overage {
                    out.push(reply::overage_warning(overage));
                }
                out.push(reply::spend_recorded(&spend));
            }
            Command::ResetSpent => {
                self.ledger.reset_spent(&mut turn).await?;
                out.push(reply::spent_reset());
            }
            Command::Balance => {
                let balance = self.ledger.balance(&turn);
                out.push(reply::balance(&balance));
            }
            Command::Help | Command::Login { .. } => {}
        }
        Ok(())
    }

    /// Commands that work before registration and skip the rollover check.
    async fn handle_without_account(
        &self,
        user_id: i64,
        command: &Command,
        out: &mut OutboundMessage,
    ) -> Result<(), LedgerError> {
        match command {
            Command::Login { handle } => {
                let registration = self.ledger.register(user_id, handle).await?;
                out.push(reply::registered(&registration));
            }
            _ => out.push(reply::help(self.issues_url.as_deref())),
        }
        Ok(())
    }
}

#[async_trait]
impl Brain for BudgetBrain {
    async fn process(&self, message: InboundMessage) -> Result<OutboundMessage, BrainError> {
        let mut out = OutboundMessage::empty_reply_to(&message);

        let command = match Command::parse(&message.text) {
            Ok(command) => command,
            Err(e) => {
                debug!("Unparsed message from {}: {}", message.user_id, e);
                out.push(reply::parse_error(&e));
                return Ok(out);
            }
        };

        let kind = command.kind();
        debug!("Command {} from user {}", kind.name(), message.user_id);

        // Help never touches the store.
        let _guard = match command {
            Command::Help => None,
            _ => Some(self.locks.lock(message.user_id).await),
        };
        if let Err(e) = self.handle(message.user_id, &command, &mut out).await {
            out.push(error_reply(&e, kind, message.user_id));
        }

        Ok(out)
    }

    fn name(&self) -> &str {
        "BudgetBrain"
    }

    async fn shutdown(&self) -> Result<(), BrainError> {
        self.ledger.db().close().await;
        Ok(())
    }
}

/// Translate a ledger failure into the text shown to the user.
fn error_reply(error: &LedgerError, kind: CommandKind, user_id: i64) -> String {
    match error {
        LedgerError::NotRegistered(_) => reply::not_registered(),
        LedgerError::AlreadyRegistered { handle } => reply::already_registered(handle),
        LedgerError::NotEndorsed {
            handle,
            endorsement_url,
        } => {
            info!("GitHub user {} has not starred the repository", handle);
            reply::not_endorsed(endorsement_url)
        }
        LedgerError::ExternalCheckFailed(e) => {
            error!(
                "GitHub check failed for user {} ({}): {}",
                user_id,
                kind.name(),
                e
            );
            reply::external_check_failed()
        }
        LedgerError::InvalidAmount(_) => reply::invalid_amount(kind),
        LedgerError::NoActiveBudget(_) => reply::no_active_budget(),
        LedgerError::Store(e) => {
            error!(
                "Store failure for user {} ({}): {}",
                user_id,
                kind.name(),
                e
            );
            reply::store_failure()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use github_stars::GithubError;

    struct NoStargazers;

    #[async_trait]
    impl EndorserSource for NoStargazers {
        async fn fetch_endorsers(&self) -> Result<Vec<String>, GithubError> {
            Ok(Vec::new())
        }

        fn endorsement_url(&self) -> String {
            "https://github.com/owner/budgetbot".to_string()
        }
    }

    #[tokio::test]
    async fn test_user_locks_do_not_accumulate() {
        let db = Database::in_memory().await.unwrap();
        let clock = Arc::new(FixedClock::at_period("2024-05".parse().unwrap()));
        let brain = BudgetBrain::new(Ledger::new(db, Arc::new(NoStargazers), clock));

        for user_id in 0..50 {
            for text in ["/help", "/balance", "/login someone"] {
                brain
                    .process(InboundMessage::direct(user_id, text, 0))
                    .await
                    .unwrap();
            }
        }
        assert!(brain.locks.is_empty());
    }

    #[test]
    fn test_command_menu() {
        let menu = BudgetBrain::command_menu();
        assert_eq!(menu.len(), 6);
        assert_eq!(menu[0].0, "login");
        assert!(menu.iter().any(|(name, _)| *name == "resetspent"));
        assert!(menu.iter().all(|(_, description)| !description.is_empty()));
    }
}
