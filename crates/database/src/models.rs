//! Database models.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::DatabaseError;
use crate::period::BudgetPeriod;

/// A registered bot user, keyed by their Telegram user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Telegram user id.
    pub user_id: i64,
    /// GitHub login the account was registered with.
    pub github_login: String,
    /// Monthly budget; zero means no budget has been set.
    pub monthly_budget: Decimal,
    /// Running spend total for `budget_period`.
    pub spent: Decimal,
    /// Month that `spent` applies to.
    pub budget_period: BudgetPeriod,
}

impl Account {
    /// Whether a monthly budget has been set.
    pub fn has_budget(&self) -> bool {
        self.monthly_budget > Decimal::ZERO
    }

    /// Budget left for the period; negative once overspent.
    pub fn remaining(&self) -> Decimal {
        self.monthly_budget - self.spent
    }
}

/// Raw `accounts` row. Amounts are stored as decimal strings.
#[derive(Debug, FromRow)]
pub(crate) struct AccountRow {
    pub user_id: i64,
    pub github_login: String,
    pub monthly_budget: String,
    pub spent: String,
    pub budget_period: String,
}

impl TryFrom<AccountRow> for Account {
    type Error = DatabaseError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let monthly_budget = parse_amount("monthly_budget", &row.monthly_budget)?;
        let spent = parse_amount("spent", &row.spent)?;
        let budget_period =
            BudgetPeriod::from_str(&row.budget_period).map_err(|_| DatabaseError::Corrupt {
                column: "budget_period",
                value: row.budget_period.clone(),
            })?;

        Ok(Self {
            user_id: row.user_id,
            github_login: row.github_login,
            monthly_budget,
            spent,
            budget_period,
        })
    }
}

fn parse_amount(column: &'static str, value: &str) -> Result<Decimal, DatabaseError> {
    Decimal::from_str(value).map_err(|_| DatabaseError::Corrupt {
        column,
        value: value.to_string(),
    })
}
