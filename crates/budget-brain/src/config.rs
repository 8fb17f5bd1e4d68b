//! Configuration for BudgetBrain.

use std::env;
use std::sync::Arc;

use brain_core::BrainError;
use chrono::FixedOffset;

use crate::clock::{Clock, SystemClock};

const DEFAULT_SQLITE_PATH: &str = "./data/budgetbot.db";

/// Configuration for BudgetBrain.
#[derive(Debug, Clone)]
pub struct BudgetBrainConfig {
    /// SQLite URL for the account database.
    pub sqlite_url: String,
    /// Offset from UTC that decides when a month starts; local time if unset.
    pub utc_offset: Option<FixedOffset>,
    /// Where users can report problems, shown in the help text.
    pub issues_url: Option<String>,
}

impl BudgetBrainConfig {
    /// Create a new config from a SQLite path or URL.
    pub fn from_sqlite_path(path: impl AsRef<str>) -> Self {
        Self {
            sqlite_url: sqlite_url_from_path(path.as_ref()),
            utc_offset: None,
            issues_url: None,
        }
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    pub fn with_issues_url(mut self, url: impl Into<String>) -> Self {
        self.issues_url = Some(url.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `SQLITE_PATH` (path or sqlite URL, default: ./data/budgetbot.db)
    /// - `BUDGET_UTC_OFFSET_MINUTES` (default: local time zone)
    /// - `BUDGET_ISSUES_URL`
    pub fn from_env() -> Result<Self, BrainError> {
        let sqlite_path =
            env::var("SQLITE_PATH").unwrap_or_else(|_| DEFAULT_SQLITE_PATH.to_string());

        let utc_offset = match env::var("BUDGET_UTC_OFFSET_MINUTES") {
            Ok(value) => Some(parse_utc_offset(&value)?),
            Err(_) => None,
        };

        let issues_url = env::var("BUDGET_ISSUES_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Ok(Self {
            sqlite_url: sqlite_url_from_path(&sqlite_path),
            utc_offset,
            issues_url,
        })
    }

    /// The clock that decides the current budget period.
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self.utc_offset {
            Some(offset) => Arc::new(SystemClock::with_offset(offset)),
            None => Arc::new(SystemClock::local()),
        }
    }
}

/// Turn a plain file path into a sqlite URL that creates the file if missing.
pub fn sqlite_url_from_path(path: &str) -> String {
    if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite:{}?mode=rwc", path)
    }
}

fn parse_utc_offset(value: &str) -> Result<FixedOffset, BrainError> {
    let minutes: i32 = value.trim().parse().map_err(|_| {
        BrainError::Configuration(format!(
            "BUDGET_UTC_OFFSET_MINUTES must be a whole number of minutes, got {:?}",
            value
        ))
    })?;
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            BrainError::Configuration(format!(
                "BUDGET_UTC_OFFSET_MINUTES out of range: {}",
                minutes
            ))
        })
}
