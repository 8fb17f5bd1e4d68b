use std::sync::Arc;

use budget_brain::{BudgetBrain, BudgetBrainConfig};
use database::account;
use github_stars::StargazerClient;
use message_listener::{MessageProcessor, ProcessorConfig};
use telegram_client::{BotCommand, BotConfig, TelegramClient};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bot_config = BotConfig::from_env()?;
    let stargazers = StargazerClient::from_env()?;
    info!(
        "Registration requires a star on {}",
        stargazers.repository_url()
    );

    let brain = BudgetBrain::connect(BudgetBrainConfig::from_env()?, Arc::new(stargazers)).await?;
    let accounts = account::count_accounts(brain.ledger().db().pool()).await?;
    info!("{} registered accounts", accounts);

    let (client, me) = TelegramClient::connect(bot_config).await?;

    let commands = BudgetBrain::command_menu()
        .into_iter()
        .map(|(name, description)| BotCommand::new(name, description))
        .collect();
    if let Err(e) = client.set_my_commands(commands).await {
        warn!("Failed to register command menu: {}", e);
    }

    let processor = MessageProcessor::new(client, brain, ProcessorConfig::with_bot_user_id(me.id));
    processor
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
