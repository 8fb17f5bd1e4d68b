//! Account store operations.

use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Account, AccountRow};
use crate::period::BudgetPeriod;

/// Get an account by Telegram user id.
pub async fn get_account(pool: &SqlitePool, user_id: i64) -> Result<Option<Account>> {
    let row = sqlx::query_as::<_, AccountRow>(
        r#"
        SELECT user_id, github_login, monthly_budget, spent, budget_period
        FROM accounts
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(Account::try_from).transpose()
}

/// Create an account on first registration, or replace the GitHub login of an
/// existing one. Budget, spend and period of an existing account are kept.
pub async fn upsert_on_register(
    pool: &SqlitePool,
    user_id: i64,
    github_login: &str,
    period: BudgetPeriod,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO accounts (user_id, github_login, budget_period)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            github_login = excluded.github_login,
            updated_at = datetime('now')
        "#,
    )
    .bind(user_id)
    .bind(github_login)
    .bind(period.to_string())
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "GitHub login",
                    id: github_login.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Find which account, if any, owns a GitHub login (case-insensitive).
pub async fn handle_owner(pool: &SqlitePool, github_login: &str) -> Result<Option<i64>> {
    let owner = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT user_id FROM accounts
        WHERE github_login = ?
        "#,
    )
    .bind(github_login)
    .fetch_optional(pool)
    .await?;

    Ok(owner)
}

/// Set the monthly budget and move the account into `period`. Spend is kept.
pub async fn set_budget_fields(
    pool: &SqlitePool,
    user_id: i64,
    amount: Decimal,
    period: BudgetPeriod,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET monthly_budget = ?, budget_period = ?, updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(amount.to_string())
    .bind(period.to_string())
    .bind(user_id)
    .execute(pool)
    .await?;

    ensure_updated(result.rows_affected(), user_id)
}

/// Overwrite the running spend total.
pub async fn set_spent(pool: &SqlitePool, user_id: i64, amount: Decimal) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET spent = ?, updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(amount.to_string())
    .bind(user_id)
    .execute(pool)
    .await?;

    ensure_updated(result.rows_affected(), user_id)
}

/// Zero the spend total and move the account into `period`.
pub async fn start_period(pool: &SqlitePool, user_id: i64, period: BudgetPeriod) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET spent = '0', budget_period = ?, updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(period.to_string())
    .bind(user_id)
    .execute(pool)
    .await?;

    ensure_updated(result.rows_affected(), user_id)
}

/// Count registered accounts.
pub async fn count_accounts(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM accounts
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

fn ensure_updated(rows_affected: u64, user_id: i64) -> Result<()> {
    if rows_affected == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Account",
            id: user_id.to_string(),
        });
    }
    Ok(())
}
