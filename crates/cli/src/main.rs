mod config_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    reelpost_config::ReelpostConfig,
    reelpost_sessions::{ChatSettingsStore, MemoryChatSettingsStore, SqliteChatSettingsStore},
    reelpost_telegram::BotState,
    reelpost_workflow::Machine,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "reelpost", about = "reelpost: episode video publishing bot for Telegram")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of searching the standard locations.
    #[arg(long, global = true, env = "REELPOST_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (default when no subcommand is provided).
    Run,
    /// Validate the configuration and report errors/warnings.
    CheckConfig,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

async fn open_settings_store(config: &ReelpostConfig) -> anyhow::Result<Arc<dyn ChatSettingsStore>> {
    match &config.storage.database {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let path = path
                .to_str()
                .with_context(|| format!("database path is not UTF-8: {}", path.display()))?;
            let store = SqliteChatSettingsStore::open(path).await?;
            info!(path, "chat settings persisted to sqlite");
            Ok(Arc::new(store))
        },
        None => {
            info!("chat settings kept in memory");
            Ok(Arc::new(MemoryChatSettingsStore::new()))
        },
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let (config, source) = config_commands::load(cli.config.as_deref())?;
    match &source {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("no config file found, using defaults"),
    }

    let diagnostics = config_commands::diagnose(&config);
    for d in &diagnostics.diagnostics {
        warn!("{d}");
    }
    if diagnostics.has_errors() {
        anyhow::bail!("invalid configuration; run `reelpost check-config` for details");
    }

    let machine = Machine::new(config.publish.clone())?;
    let settings = open_settings_store(&config).await?;
    let (bot, bot_username) = reelpost_telegram::connect(&config.telegram).await?;

    let state = Arc::new(BotState::new(bot, bot_username, machine, settings));
    let cancel = state.cancel.clone();
    let polling = reelpost_telegram::start_polling(Arc::clone(&state));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown requested");
            cancel.cancel();
        },
        _ = cancel.cancelled() => {},
    }

    polling.await?;
    info!("reelpost stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Run) => {
            info!(version = env!("CARGO_PKG_VERSION"), "reelpost starting");
            run(&cli).await
        },
        Some(Commands::CheckConfig) => config_commands::check(cli.config.as_deref()),
    }
}
