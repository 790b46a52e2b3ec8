//! Process entry points: the full bot (HTTP + scheduler), the scheduler alone, and one-shot triggers.

use std::time::Duration;

use anyhow::{Context, Result};
use herald_core::init_tracing;
use herald_telegram::register_webhook;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::components::{build_scheduler, initialize_bot_components, BotComponents};
use crate::config::BotConfig;
use crate::content::ContentJob;
use crate::server::{build_router, AppState};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Validates config, installs logging and builds components. Fails before any port is bound.
async fn start(config: &BotConfig) -> Result<(BotComponents, teloxide::Bot)> {
    config.validate()?;
    init_tracing(&config.log_file)?;
    info!(
        database_url = %config.database_url,
        report_chat_id = config.report_chat_id,
        "Initializing bot"
    );
    initialize_bot_components(config).await
}

async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        }
        _ = cancel.cancelled() => {}
    }
}

/// Serves the webhook and trigger endpoints and runs the scheduler in the same process.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    let (components, teloxide_bot) = start(&config).await?;
    let cancel = CancellationToken::new();

    let sweeper = components
        .cache
        .clone()
        .spawn_sweeper(components.cache.window() / 2, cancel.clone());

    let scheduler = build_scheduler(&config, &components)?;
    info!(jobs = scheduler.len(), "Scheduler configured");
    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

    if let Some(url) = config.webhook_url() {
        if let Err(e) = register_webhook(&teloxide_bot, &url).await {
            error!(error = %e, "Webhook registration failed; serving anyway");
        }
    } else {
        warn!("WEBHOOK_BASE_URL not set; webhook registration skipped");
    }

    let state = AppState {
        dispatcher: components.dispatcher.clone(),
        content: components.content.clone(),
        report_chat_id: config.report_chat_id,
    };
    let app = build_router(state, &config.webhook_path);
    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, path = %config.webhook_path, "HTTP server listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await;

    cancel.cancel();
    components.dispatcher.shutdown(SHUTDOWN_GRACE).await;
    if let Err(e) = scheduler_task.await {
        error!(error = %e, "Scheduler task ended abnormally");
    }
    if let Err(e) = sweeper.await {
        error!(error = %e, "Cache sweeper ended abnormally");
    }
    info!("Bot stopped");
    served.context("HTTP server failed")
}

/// Runs only the scheduler loop until ctrl-c.
#[instrument(skip(config))]
pub async fn run_scheduler_only(config: BotConfig) -> Result<()> {
    let (components, _) = start(&config).await?;
    let cancel = CancellationToken::new();
    let scheduler = build_scheduler(&config, &components)?;
    let ran_today = scheduler.ran_today().await;
    for (key, at) in scheduler.next_fires() {
        info!(
            job = %key,
            next_fire = %at,
            ran_today = ran_today.contains(&key),
            "Job scheduled"
        );
    }
    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

    shutdown_signal(cancel.clone()).await;
    cancel.cancel();
    scheduler_task.await.context("Scheduler task ended abnormally")?;
    info!("Scheduler stopped");
    Ok(())
}

/// Runs one content job against the report chat and exits.
#[instrument(skip(config))]
pub async fn run_trigger(config: BotConfig, job: ContentJob) -> Result<()> {
    let (components, _) = start(&config).await?;
    components
        .content
        .run(job, config.report_chat_id)
        .await
        .with_context(|| format!("{} failed", job))?;
    info!(job = %job, "Content job sent");
    Ok(())
}
