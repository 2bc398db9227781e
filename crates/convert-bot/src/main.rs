//! Telegram file conversion bot
//!
//! Receives files and text from Telegram, keeps one pending conversion per
//! user and runs the chosen operation in the background, sending the result
//! back to the chat.

mod config;
mod errors;
mod gateway;
mod handlers;
mod health;
mod inbound;
mod registry;

use anyhow::Result;
use clap::Parser;
use teloxide::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use convert_core::{EventRouter, JobReport, JobRunner, SessionStore};

use crate::config::Config;
use crate::gateway::TelegramGateway;
use crate::registry::ProcessRegistry;

/// Telegram file conversion bot CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/convert-bot.toml")]
    config: String,

    /// Telegram bot token (overrides config file)
    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    bot_token: Option<String>,

    /// Scratch directory for jobs (overrides config file)
    #[arg(long, env = "CONVERT_WORK_DIR")]
    work_dir: Option<String>,

    /// Health check server port
    #[arg(long, env = "HEALTH_CHECK_PORT", default_value = "3000")]
    health_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "convert_bot=debug,convert_core=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting convert bot");

    let args = Args::parse();

    let mut config = if std::path::Path::new(&args.config).exists() {
        info!("Loading config from file: {}", args.config);
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using environment variables");
        Config::from_env()?
    };
    if let Some(bot_token) = args.bot_token {
        config.telegram.bot_token = bot_token;
    }
    if let Some(work_dir) = args.work_dir {
        config.converters.work_dir = work_dir.into();
    }
    config.validate()?;

    info!(
        work_dir = %config.converters.work_dir.display(),
        timeout_secs = config.converters.timeout_secs,
        session_ttl_secs = ?config.sessions.ttl_secs,
        "Configuration loaded"
    );
    tokio::fs::create_dir_all(&config.converters.work_dir).await?;

    let bot = Bot::new(&config.telegram.bot_token);

    let bot_username = match bot.get_me().await {
        Ok(me) => {
            let username = me.username().to_string();
            info!("Bot authenticated as: @{}", username);
            Some(username)
        }
        Err(e) => {
            error!("Failed to authenticate bot: {}", e);
            return Err(e.into());
        }
    };

    let health_state = health::AppState::new(bot_username);
    health_state.set_telegram_connected(true).await;

    let health_state_clone = health_state.clone();
    let health_port = args.health_port;
    tokio::spawn(async move {
        if let Err(e) = health::start_health_server(health_state_clone, health_port).await {
            error!("Health check server error: {}", e);
        }
    });

    let gateway = TelegramGateway::new(bot.clone());
    let registry = ProcessRegistry::new(gateway.clone(), &config.converters);
    info!(operations = ?registry.configured(), "Converters configured");

    let (report_tx, report_rx) = mpsc::unbounded_channel();
    let runner = JobRunner::new(gateway.clone(), registry, config.converters.work_dir.clone())
        .with_reports(report_tx);
    tokio::spawn(record_reports(report_rx, health_state.clone()));

    let store = SessionStore::new().with_ttl(config.sessions.ttl());
    if config.sessions.ttl().is_some() {
        tokio::spawn(sweep_sessions(
            store.clone(),
            health_state.clone(),
            config.sessions.sweep_interval(),
        ));
    }

    let router = EventRouter::new(store, runner, gateway, config.features.router_config());

    info!("Bot initialized, starting message dispatcher...");

    let handler = Update::filter_message().endpoint(handlers::handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router, health_state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Convert bot stopped");
    Ok(())
}

async fn record_reports(mut reports: mpsc::UnboundedReceiver<JobReport>, health: health::AppState) {
    while let Some(report) = reports.recv().await {
        debug!(
            job_id = %report.job_id,
            operation = report.operation,
            success = report.outcome.is_success(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Job finished"
        );
        health.record_report(&report).await;
    }
}

async fn sweep_sessions(store: SessionStore, health: health::AppState, every: std::time::Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let purged = store.purge_expired().await;
        if purged > 0 {
            info!(purged, "Purged expired sessions");
        }
        health.set_sessions_pending(store.len().await).await;
    }
}
