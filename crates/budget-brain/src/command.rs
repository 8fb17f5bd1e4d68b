//! Command parsing.
//!
//! Messages look like `/spend 12.50`. The slash is optional, the command word
//! is case-insensitive and a Telegram `@botname` suffix is ignored.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// The commands the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Login,
    SetBudget,
    Spend,
    ResetSpent,
    Balance,
    Help,
}

impl CommandKind {
    /// All commands, in menu order.
    pub const ALL: [CommandKind; 6] = [
        CommandKind::Login,
        CommandKind::SetBudget,
        CommandKind::Spend,
        CommandKind::ResetSpent,
        CommandKind::Balance,
        CommandKind::Help,
    ];

    /// Command word without the slash.
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Login => "login",
            CommandKind::SetBudget => "setbudget",
            CommandKind::Spend => "spend",
            CommandKind::ResetSpent => "resetspent",
            CommandKind::Balance => "balance",
            CommandKind::Help => "help",
        }
    }

    pub fn usage(&self) -> &'static str {
        match self {
            CommandKind::Login => "/login github_username",
            CommandKind::SetBudget => "/setbudget amount",
            CommandKind::Spend => "/spend amount",
            CommandKind::ResetSpent => "/resetspent",
            CommandKind::Balance => "/balance",
            CommandKind::Help => "/help",
        }
    }

    /// Short description for the command menu.
    pub fn description(&self) -> &'static str {
        match self {
            CommandKind::Login => "Register: /login github_username",
            CommandKind::SetBudget => "Set your monthly budget: /setbudget amount",
            CommandKind::Spend => "Record an expense: /spend amount",
            CommandKind::ResetSpent => "Reset this month's spending",
            CommandKind::Balance => "Show your remaining budget",
            CommandKind::Help => "Show the command list",
        }
    }

    fn arity(&self) -> usize {
        match self {
            CommandKind::Login | CommandKind::SetBudget | CommandKind::Spend => 1,
            CommandKind::ResetSpent | CommandKind::Balance | CommandKind::Help => 0,
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        match word {
            "login" => Some(CommandKind::Login),
            "setbudget" => Some(CommandKind::SetBudget),
            "spend" => Some(CommandKind::Spend),
            "resetspent" => Some(CommandKind::ResetSpent),
            "balance" => Some(CommandKind::Balance),
            "help" | "start" => Some(CommandKind::Help),
            _ => None,
        }
    }
}

/// A parsed command with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { handle: String },
    SetBudget { amount: Decimal },
    Spend { amount: Decimal },
    ResetSpent,
    Balance,
    Help,
}

/// Why a message is not a usable command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty message")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("wrong number of arguments for {}", .0.name())]
    Usage(CommandKind),

    #[error("{input:?} is not a number")]
    InvalidNumber { kind: CommandKind, input: String },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Login { .. } => CommandKind::Login,
            Command::SetBudget { .. } => CommandKind::SetBudget,
            Command::Spend { .. } => CommandKind::Spend,
            Command::ResetSpent => CommandKind::ResetSpent,
            Command::Balance => CommandKind::Balance,
            Command::Help => CommandKind::Help,
        }
    }

    /// Whether the command acts on an existing account.
    ///
    /// These are the commands that run the month rollover check first.
    pub fn needs_account(&self) -> bool {
        !matches!(self, Command::Login { .. } | Command::Help)
    }

    /// Parse a message into a command.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut words = text.split_whitespace();
        let first = words.next().ok_or(ParseError::Empty)?;
        let args: Vec<&str> = words.collect();

        let word = command_word(first);
        let kind = CommandKind::from_word(&word).ok_or(ParseError::Unknown(word))?;

        if args.len() != kind.arity() {
            return Err(ParseError::Usage(kind));
        }

        let amount = |input: &str| {
            parse_amount(input).ok_or_else(|| ParseError::InvalidNumber {
                kind,
                input: input.to_string(),
            })
        };

        Ok(match kind {
            CommandKind::Login => Command::Login {
                handle: args[0].trim_start_matches('@').to_string(),
            },
            CommandKind::SetBudget => Command::SetBudget {
                amount: amount(args[0])?,
            },
            CommandKind::Spend => Command::Spend {
                amount: amount(args[0])?,
            },
            CommandKind::ResetSpent => Command::ResetSpent,
            CommandKind::Balance => Command::Balance,
            CommandKind::Help => Command::Help,
        })
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Normalise `/Spend@budget_bot` to `spend`.
fn command_word(token: &str) -> String {
    let token = token.strip_prefix('/').unwrap_or(token);
    let token = token.split_once('@').map_or(token, |(word, _bot)| word);
    token.to_lowercase()
}

/// Parse a plain decimal amount, accepting `,` as the decimal separator.
///
/// Sign and range are not checked here; the ledger rejects non-positive
/// amounts.
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let normalized = input.trim().replace(',', ".");
    if normalized.is_empty()
        || !normalized
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == '+')
    {
        return None;
    }
    Decimal::from_str(&normalized).ok()
}
