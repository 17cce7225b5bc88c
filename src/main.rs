//! Membership Bot - Main Entry Point
//!
//! A Telegram bot that rewards users with premium time for adding it to
//! groups, relays owner content to every group and user, and keeps the
//! premium ledger tidy in the background.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use membership_bot::access::{Authority, ChannelGate};
use membership_bot::commands::CommandHandler;
use membership_bot::config::{
    BotConfig, BotSettings, DEFAULT_BACKUP_DIR, DEFAULT_DATA_FILE, telegram_link,
};
use membership_bot::dispatch::DispatchEngine;
use membership_bot::reward::RewardEngine;
use membership_bot::scheduler::{
    AutoShareRegistry, AutoShareScheduler, ExpirySweeper, PeriodicTask, Scheduler,
    SchedulerMessage,
};
use membership_bot::state::{JsonFileStore, StateStore};
use membership_bot::telegram::{BotApp, ChatPlatform, Notifier, TelegramBot, run_updates};

/// Telegram membership bot with group-add rewards.
#[derive(Parser, Debug)]
#[command(name = "membership_bot")]
#[command(about = "Rewards group adds with premium access and relays content")]
#[command(version)]
struct Args {
    /// Path to the persisted data file.
    #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
    data_file: PathBuf,

    /// Directory for data backups.
    #[arg(short, long, default_value = DEFAULT_BACKUP_DIR)]
    backup_dir: PathBuf,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let config = BotConfig::from_env().context("Failed to load bot configuration from environment")?;
    let settings = BotSettings::from_env_with_defaults();
    debug!("Loaded {:?} with {:?}", config, settings);

    let file_store = JsonFileStore::new(&args.data_file, config.owner_ids.clone());
    info!("Loading state from {}", file_store.path().display());
    let store = Arc::new(StateStore::open(file_store));

    let bot = TelegramBot::new(teloxide::Bot::new(&config.token));
    let username = bot
        .username()
        .await
        .context("Failed to reach the Bot API")?;

    let platform: Arc<dyn ChatPlatform> = Arc::new(bot.clone());
    let authority = Arc::new(Authority::new(config.owner_ids.clone()));
    let dispatch =
        Arc::new(DispatchEngine::new(Arc::clone(&platform)).with_pacing(settings.dispatch_pacing()));
    let registry = Arc::new(AutoShareRegistry::new());

    let mut commands = CommandHandler::new(
        Arc::clone(&store),
        Arc::clone(&authority),
        Arc::clone(&dispatch),
        Notifier::new(Arc::clone(&platform)),
        Arc::clone(&registry),
        &args.backup_dir,
        username.clone(),
    );
    if config.require_channel_join {
        info!("Requiring membership in {} for /start", config.channel_username);
        commands = commands.with_channel_gate(ChannelGate::new(
            Arc::clone(&platform),
            config.channel_username.clone(),
        ));
    }
    let commands = Arc::new(commands);
    let rewards = Arc::new(RewardEngine::new(
        Arc::clone(&store),
        Arc::clone(&platform),
        Arc::clone(&authority),
        &args.backup_dir,
    ));

    let sweeper: Arc<dyn PeriodicTask> = Arc::new(ExpirySweeper::new(
        Arc::clone(&store),
        Notifier::new(Arc::clone(&platform)),
        telegram_link(&config.developer),
        telegram_link(&config.channel_username),
    ));
    let autoshare: Arc<dyn PeriodicTask> = Arc::new(AutoShareScheduler::new(
        registry,
        Arc::clone(&store),
        dispatch,
        &config.developer,
    ));

    let (sweep_tx, sweep_rx) = mpsc::channel::<SchedulerMessage>(8);
    let (share_tx, share_rx) = mpsc::channel::<SchedulerMessage>(8);

    let sweep_scheduler = Scheduler::new(sweeper, settings.expiry_sweep_period());
    let share_scheduler = Scheduler::new(autoshare, settings.autoshare_tick_period());

    let sweep_handle = tokio::spawn(async move {
        sweep_scheduler.run(sweep_rx).await;
    });
    let share_handle = tokio::spawn(async move {
        share_scheduler.run(share_rx).await;
    });

    // Grants that lapsed while the bot was down are evicted right away.
    let _ = sweep_tx.send(SchedulerMessage::TriggerNow).await;

    info!("Starting membership bot as @{}...", username);
    info!("Bot is running. Use Ctrl+C to stop.");

    let app = Arc::new(BotApp {
        commands,
        rewards,
        platform,
    });
    run_updates(bot.inner(), app).await;

    info!("Shutting down...");
    let _ = sweep_tx.send(SchedulerMessage::Shutdown).await;
    let _ = share_tx.send(SchedulerMessage::Shutdown).await;
    let _ = sweep_handle.await;
    let _ = share_handle.await;

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
