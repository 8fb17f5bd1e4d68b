//! User-facing reply texts.

use rust_decimal::Decimal;

use crate::command::{CommandKind, ParseError};
use crate::ledger::{round_cents, Balance, Registration, Spend};
use database::BudgetPeriod;

/// Format an amount with two decimal places.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round_cents(amount))
}

/// The help text, listing every command.
pub fn help(issues_url: Option<&str>) -> String {
    let mut text = String::from(
        "This bot helps you keep personal spending in check: set a monthly budget \
         and record what you spend. Spending starts again from zero every month.\n\nCommands:\n",
    );
    for kind in CommandKind::ALL {
        text.push_str(&format!("{} - {}\n", kind.usage(), kind.description()));
    }
    if let Some(url) = issues_url {
        text.push_str(&format!(
            "\nIf something goes wrong or you have a suggestion, please open an issue:\n{}",
            url
        ));
    }
    text.trim_end().to_string()
}

/// Reply for a message that could not be parsed.
pub fn parse_error(error: &ParseError) -> String {
    match error {
        ParseError::Empty | ParseError::Unknown(_) => {
            "Unknown command, use /help to see the list of commands".to_string()
        }
        ParseError::Usage(kind) => format!("Usage: {}", kind.usage()),
        ParseError::InvalidNumber { kind, .. } => invalid_amount(*kind),
    }
}

/// Reply for an amount that is not a positive number.
pub fn invalid_amount(kind: CommandKind) -> String {
    match kind {
        CommandKind::SetBudget => "Please enter a valid positive budget amount".to_string(),
        CommandKind::Spend => "Please enter a valid positive expense amount".to_string(),
        other => format!("Usage: {}", other.usage()),
    }
}

pub fn not_registered() -> String {
    format!(
        "You are not registered yet, use {} to register",
        CommandKind::Login.usage()
    )
}

pub fn registered(registration: &Registration) -> String {
    match &registration.previous_handle {
        Some(previous) => format!(
            "Your GitHub account is now {} (was {})",
            registration.account.github_login, previous
        ),
        None => format!(
            "Registered as {}. You can now set a monthly budget with {}",
            registration.account.github_login,
            CommandKind::SetBudget.usage()
        ),
    }
}

pub fn already_registered(handle: &str) -> String {
    format!("GitHub user {} is already registered", handle)
}

pub fn not_endorsed(url: &str) -> String {
    format!(
        "Access denied: you have not starred the repository.\nPlease star it first: {}",
        url
    )
}

pub fn external_check_failed() -> String {
    "Could not check GitHub right now, please try again later".to_string()
}

pub fn store_failure() -> String {
    "Something went wrong while saving your data, please try again later".to_string()
}

pub fn budget_set(amount: Decimal, period: BudgetPeriod) -> String {
    format!("Budget set: {} for {}", format_amount(amount), period)
}

pub fn overage_warning(overage: Decimal) -> String {
    format!("Warning: you are over budget by {}", format_amount(overage))
}

pub fn spend_recorded(spend: &Spend) -> String {
    format!(
        "Expense recorded, spent {} of {} this month",
        format_amount(spend.spent),
        format_amount(spend.budget)
    )
}

pub fn spent_reset() -> String {
    "Spending for this month has been reset to 0".to_string()
}

pub fn no_active_budget() -> String {
    format!(
        "You have no active budget for this month, set one with {}",
        CommandKind::SetBudget.usage()
    )
}

pub fn balance(balance: &Balance) -> String {
    format!(
        "Your current balance: {} (spent {} of {} in {})",
        format_amount(balance.remaining),
        format_amount(balance.spent),
        format_amount(balance.budget),
        balance.period
    )
}

pub fn rollover_notice(period: BudgetPeriod) -> String {
    format!("A new month has started ({}), spending has been reset to 0", period)
}
