//! Pagewatch CLI
//!
//! Runs the watcher as a long-lived service, or performs one-off checks
//! and queries against the storage directory.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pagewatch::{
    bot::{self, TelegramClient},
    commands::{self, CommandHandler},
    error::Result,
    models::Config,
    pipeline::{CycleOutcome, Scheduler, Watcher},
    services::{LogMessenger, Messenger},
    storage::AppState,
};
use tokio_util::sync::CancellationToken;

/// Pagewatch - single-page publication watcher
#[derive(Parser, Debug)]
#[command(
    name = "pagewatch",
    version,
    about = "Watches a web page for new publications and notifies subscribers"
)]
struct Cli {
    /// Path to storage directory holding config and state files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Path to config file (default: {storage_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the page on a timer and serve chat commands until Ctrl-C
    Run,

    /// Run a single check cycle and exit
    Check,

    /// Print the most recently seen entry as JSON, or "none yet"
    Latest,

    /// Validate configuration
    Validate,

    /// List subscribed chat identities
    Subscribers,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Pick the delivery transport: Telegram when a token is configured.
fn transport(config: &Config) -> Result<(Arc<dyn Messenger>, Option<Arc<TelegramClient>>)> {
    match config.telegram.token.as_deref() {
        Some(token) => {
            let client = Arc::new(TelegramClient::new(&config.telegram, token)?);
            let messenger: Arc<dyn Messenger> = client.clone();
            Ok((messenger, Some(client)))
        }
        None => {
            log::warn!("No Telegram token configured; notifications will only be logged");
            Ok((Arc::new(LogMessenger), None))
        }
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.storage_dir.join("config.toml"));
    let mut config = Config::load_or_default(&config_path);
    config.apply_env();

    log::info!("Loaded configuration from {}", config_path.display());

    match cli.command {
        Command::Run => {
            config.validate()?;
            let state = Arc::new(AppState::load(&cli.storage_dir, &config.storage).await);
            let (messenger, telegram) = transport(&config)?;
            let watcher = Watcher::from_config(&config, messenger, Arc::clone(&state))?;

            let shutdown = CancellationToken::new();
            let (scheduler, handle) =
                Scheduler::new(watcher, config.watcher.poll_interval(), shutdown.clone());
            let scheduler = tokio::spawn(scheduler.run());

            let bot = match telegram {
                Some(client) => {
                    let handler =
                        CommandHandler::new(Arc::clone(&state), handle, config.messages.clone())
                            .with_base_url(config.watcher.page_url()?);
                    Some(tokio::spawn(bot::run_bot(
                        client,
                        Arc::new(handler),
                        shutdown.clone(),
                    )))
                }
                None => None,
            };

            log::info!("Watching {}", config.watcher.url);
            tokio::signal::ctrl_c().await?;
            log::info!("Shutdown requested, finishing in-flight work...");
            shutdown.cancel();

            if let Err(e) = scheduler.await {
                log::error!("Scheduler task failed: {}", e);
            }
            if let Some(bot) = bot {
                if let Err(e) = bot.await {
                    log::error!("Command loop task failed: {}", e);
                }
            }
        }

        Command::Check => {
            config.validate()?;
            let state = Arc::new(AppState::load(&cli.storage_dir, &config.storage).await);
            let (messenger, _) = transport(&config)?;
            let watcher = Watcher::from_config(&config, messenger, state)?;

            match watcher.run_cycle().await {
                CycleOutcome::Completed(report) => {
                    log::info!(
                        "Checked {} entries: {} new, {} delivered, {} failed{}",
                        report.candidates,
                        report.fresh.len(),
                        report.delivery.delivered,
                        report.delivery.failed,
                        if report.persisted { "" } else { " (not persisted)" }
                    );
                    for entry in &report.fresh {
                        log::info!("New: {}", entry.title.replace('\n', " "));
                    }
                }
                CycleOutcome::FetchFailed(e) => {
                    log::error!("Check failed: {}", e);
                }
            }
        }

        Command::Latest => {
            let state = AppState::load(&cli.storage_dir, &config.storage).await;
            println!("{}", commands::latest_entry_json(&state).await?);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
            log::info!(
                "Telegram: {}",
                if config.telegram.token.is_some() {
                    "token configured"
                } else {
                    "no token (log-only delivery)"
                }
            );
        }

        Command::Subscribers => {
            let state = AppState::load(&cli.storage_dir, &config.storage).await;
            let subscribers = state.subscribers().snapshot().await;
            log::info!("{} subscriber(s)", subscribers.len());
            for id in subscribers {
                println!("{}", id);
            }
        }
    }

    Ok(())
}
