//! Component factory: builds BotComponents from config. Isolates assembly logic from runner.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dispatch::{
    IdempotencyCache, PersistenceHandler, ProfanityCounter, ProfanityMatcher, RecordingSender,
    UpdateDispatcher, UpdateRouter,
};
use handler_chain::HandlerChain;
use herald_core::{Bot, BotIdentity};
use herald_telegram::{TelegramBotAdapter, TelegramConfig};
use llm_client::{ContentGenerator, LlmContentGenerator, LlmClient, OpenAILlmClient};
use scheduler::{AnnouncementSweep, Clock, JobScheduler, SystemClock};
use storage::{ExecutionLedger, Repositories};
use tracing::{info, instrument, warn};

use crate::briefing::{BriefingSource, WebBriefingSource};
use crate::config::BotConfig;
use crate::content::ContentService;
use crate::handlers::{ChatHandlers, HandlerSettings};
use crate::schedule::{build_jobs, register_jobs};
use crate::video::{RapidApiDownloader, VideoFetcher};

const DB_CONNECT_ATTEMPTS: u32 = 5;
const DB_CONNECT_DELAY: Duration = Duration::from_secs(2);

/// External collaborators; production builds them from config, tests substitute fakes.
pub struct Collaborators {
    pub bot: Arc<dyn Bot>,
    pub identity: BotIdentity,
    pub generator: Arc<dyn ContentGenerator>,
    pub briefing: Arc<dyn BriefingSource>,
    pub video: Arc<dyn VideoFetcher>,
    pub clock: Arc<dyn Clock>,
}

/// Core dependencies for the HTTP surface and the scheduler.
pub struct BotComponents {
    pub repos: Repositories,
    pub identity: BotIdentity,
    pub clock: Arc<dyn Clock>,
    pub sender: RecordingSender,
    pub content: Arc<ContentService>,
    pub handlers: Arc<ChatHandlers>,
    pub cache: Arc<IdempotencyCache>,
    pub dispatcher: UpdateDispatcher,
}

/// Assembles components around already-built collaborators and repositories.
#[instrument(skip_all)]
pub fn build_bot_components(
    config: &BotConfig,
    repos: Repositories,
    collaborators: Collaborators,
) -> Result<BotComponents> {
    let Collaborators {
        bot,
        identity,
        generator,
        briefing,
        video,
        clock,
    } = collaborators;

    let sender = RecordingSender::new(bot, repos.messages.clone(), identity.clone());
    let content = Arc::new(ContentService::new(
        sender.clone(),
        repos.messages.clone(),
        repos.counters.clone(),
        generator.clone(),
        briefing,
        clock.clone(),
    ));
    let handlers = Arc::new(ChatHandlers::new(
        sender.clone(),
        content.clone(),
        generator,
        repos.messages.clone(),
        repos.announcements.clone(),
        video,
        HandlerSettings {
            report_chat_id: config.report_chat_id,
            translate_target_language: config.translate_target_language.clone(),
        },
    ));

    let cache = Arc::new(IdempotencyCache::new(config.idempotency_window));
    let chain = build_handler_chain(config, &repos, &sender, &identity, handlers.clone())?;
    let dispatcher = UpdateDispatcher::new(cache.clone(), chain, config.max_concurrent_updates);

    Ok(BotComponents {
        repos,
        identity,
        clock,
        sender,
        content,
        handlers,
        cache,
        dispatcher,
    })
}

/// Builds the handler chain (persistence → profanity counter → router).
pub fn build_handler_chain(
    config: &BotConfig,
    repos: &Repositories,
    sender: &RecordingSender,
    identity: &BotIdentity,
    handlers: Arc<ChatHandlers>,
) -> Result<HandlerChain> {
    let matcher = ProfanityMatcher::new().context("Failed to compile profanity patterns")?;
    let router = UpdateRouter::new(
        identity.clone(),
        config.owner_user_id,
        repos.messages.clone(),
        handlers,
    );
    Ok(HandlerChain::new()
        .add_handler(Arc::new(PersistenceHandler::new(repos.messages.clone())))
        .add_handler(Arc::new(ProfanityCounter::new(
            matcher,
            repos.counters.clone(),
            sender.clone(),
        )))
        .add_handler(Arc::new(router)))
}

/// Builds the job scheduler with the full daily schedule for the report chat.
pub fn build_scheduler(config: &BotConfig, components: &BotComponents) -> Result<JobScheduler> {
    let ledger: Arc<dyn ExecutionLedger> = Arc::new(components.repos.jobs.clone());
    let mut scheduler = JobScheduler::new(ledger, components.clock.clone(), config.scheduler_poll);
    let sweep = AnnouncementSweep::new(
        components.repos.announcements.clone(),
        components.sender.clone(),
    );
    let jobs = build_jobs(
        components.content.clone(),
        config.report_chat_id,
        sweep,
        config.announcement_sweep,
    )?;
    register_jobs(&mut scheduler, jobs);
    Ok(scheduler)
}

/// Connects storage, the Telegram API and the LLM from config, then assembles components.
/// Returns the raw teloxide client as well, for webhook registration.
#[instrument(skip(config))]
pub async fn initialize_bot_components(
    config: &BotConfig,
) -> Result<(BotComponents, teloxide::Bot)> {
    let repos = Repositories::connect(&config.database_url, DB_CONNECT_ATTEMPTS, DB_CONNECT_DELAY)
        .await
        .with_context(|| format!("Failed to initialize storage at {}", config.database_url))?;

    let telegram = TelegramConfig {
        bot_token: config.bot_token.clone(),
        api_url: config.telegram_api_url.clone(),
    };
    let teloxide_bot = telegram.build_bot()?;
    let adapter = TelegramBotAdapter::new(teloxide_bot.clone());
    let identity = adapter
        .identity()
        .await
        .context("Failed to resolve the bot identity")?;
    info!(bot_id = identity.id, username = %identity.username, "Bot identity resolved");

    if !config.llm.has_api_key() {
        warn!("OPENAI_API_KEY not set; generated content will report errors");
    }
    let llm: Arc<dyn LlmClient> = Arc::new(OpenAILlmClient::from_settings(&config.llm));
    let briefing = WebBriefingSource::new(config.http_timeout)?;
    if config.rapidapi_key.is_empty() {
        warn!("RAPIDAPI_KEY not set; video links will fail to resolve");
    }
    let video = RapidApiDownloader::new(
        config.rapidapi_endpoint(),
        config.rapidapi_key.clone(),
        config.rapidapi_host.clone(),
        config.http_timeout,
    );

    let collaborators = Collaborators {
        bot: Arc::new(adapter),
        identity,
        generator: Arc::new(LlmContentGenerator::new(llm)),
        briefing: Arc::new(briefing),
        video: Arc::new(video),
        clock: Arc::new(SystemClock),
    };
    let components = build_bot_components(config, repos, collaborators)?;
    Ok((components, teloxide_bot))
}
