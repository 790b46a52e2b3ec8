//! Shared fixtures: recording bot, generator mock, fixed collaborators and in-memory components.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use herald_bot::briefing::{BitcoinQuote, Briefing, BriefingSource, CityWeather};
use herald_bot::config::BotConfig;
use herald_bot::video::{VideoError, VideoFetcher};
use herald_bot::{build_bot_components, BotComponents, Collaborators};
use herald_core::{Bot, BotIdentity, DbotError, OutgoingContent, Result, TextFormat};
use llm_client::{ContentGenerator, LlmSettings};
use mockall::mock;
use prompt::ChatMessage;
use scheduler::Clock;
use storage::Repositories;

pub const BOT_ID: i64 = 777;
pub const BOT_USERNAME: &str = "herald_bot";
pub const REPORT_CHAT: i64 = -100500;
pub const OWNER_ID: i64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentKind {
    Text,
    Photo,
    Video,
}

#[derive(Debug, Clone)]
pub struct SentRecord {
    pub chat_id: i64,
    pub kind: SentKind,
    pub text: Option<String>,
    pub reply_to: Option<i64>,
}

/// Records every send; sends to `failing_chat` fail.
pub struct MockBot {
    next_id: AtomicI64,
    failing_chat: Option<i64>,
    sent: Mutex<Vec<SentRecord>>,
}

impl MockBot {
    pub fn new() -> Arc<Self> {
        Self::failing_for(None)
    }

    pub fn failing_for(chat_id: Option<i64>) -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicI64::new(500),
            failing_chat: chat_id,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<SentRecord> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<SentRecord> {
        self.sent()
            .into_iter()
            .filter(|r| r.chat_id == chat_id)
            .collect()
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send(
        &self,
        chat_id: i64,
        content: OutgoingContent,
        _format: TextFormat,
        reply_to: Option<i64>,
    ) -> Result<i64> {
        if self.failing_chat == Some(chat_id) {
            return Err(DbotError::Bot("chat not found".to_string()));
        }
        let kind = match &content {
            OutgoingContent::Text(_) => SentKind::Text,
            OutgoingContent::Photo { .. } => SentKind::Photo,
            OutgoingContent::Video { .. } => SentKind::Video,
        };
        self.sent.lock().unwrap().push(SentRecord {
            chat_id,
            kind,
            text: content.text().map(str::to_string),
            reply_to,
        });
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

mock! {
    pub Generator {}

    #[async_trait]
    impl ContentGenerator for Generator {
        async fn summarize(&self, lines: &[(Option<String>, String)]) -> anyhow::Result<String>;
        async fn expert_answer(&self, history: Vec<ChatMessage>, question: &str) -> anyhow::Result<String>;
        async fn translate(&self, text: &str, target_language: &str) -> anyhow::Result<String>;
        async fn random_fact(&self) -> anyhow::Result<String>;
        async fn history_fact(&self) -> anyhow::Result<String>;
    }
}

/// Briefing with every field filled.
pub struct StaticBriefing;

#[async_trait]
impl BriefingSource for StaticBriefing {
    async fn collect(&self) -> Briefing {
        Briefing {
            weather: vec![
                CityWeather {
                    city: "Kyiv".to_string(),
                    temperature: Some("+12°".to_string()),
                },
                CityWeather {
                    city: "Odesa".to_string(),
                    temperature: None,
                },
            ],
            usd_rate: Some("41.25".to_string()),
            bitcoin: Some(BitcoinQuote {
                price: "$67,000".to_string(),
                change: "+1.2%".to_string(),
            }),
            news: Some(vec!["First headline".to_string()]),
        }
    }
}

/// Answers every link the same way.
pub enum StaticVideo {
    Bytes(Vec<u8>),
    TooLarge,
    Unresolvable,
}

#[async_trait]
impl VideoFetcher for StaticVideo {
    async fn fetch(&self, _link: &str) -> std::result::Result<Vec<u8>, VideoError> {
        match self {
            Self::Bytes(data) => Ok(data.clone()),
            Self::TooLarge => Err(VideoError::TooLarge { size_mb: 64.5 }),
            Self::Unresolvable => Err(VideoError::NoVideo),
        }
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// 2024-05-17 12:00 UTC.
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap()
}

pub fn test_config() -> BotConfig {
    BotConfig {
        bot_token: "123:test".to_string(),
        telegram_api_url: None,
        database_url: "sqlite::memory:".to_string(),
        log_file: "logs/test.log".to_string(),
        llm: LlmSettings {
            api_key: String::new(),
            base_url: llm_client::DEFAULT_BASE_URL.to_string(),
            model: llm_client::DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(5),
        },
        report_chat_id: REPORT_CHAT,
        owner_user_id: OWNER_ID,
        webhook_base_url: None,
        webhook_path: "/webhook".to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        rapidapi_key: String::new(),
        rapidapi_host: "rapid.test".to_string(),
        idempotency_window: Duration::from_secs(60),
        scheduler_poll: Duration::from_secs(30),
        announcement_sweep: Duration::from_secs(300),
        max_concurrent_updates: 4,
        http_timeout: Duration::from_secs(5),
        translate_target_language: "Ukrainian".to_string(),
    }
}

pub struct Harness {
    pub bot: Arc<MockBot>,
    pub components: BotComponents,
}

/// Components on an in-memory database around `generator` and a recording bot.
pub async fn harness(generator: MockGenerator) -> Harness {
    harness_with(MockBot::new(), generator, StaticVideo::Bytes(vec![1, 2, 3])).await
}

pub async fn harness_with(bot: Arc<MockBot>, generator: MockGenerator, video: StaticVideo) -> Harness {
    let config = test_config();
    let repos = Repositories::connect(&config.database_url, 1, Duration::from_millis(10))
        .await
        .expect("in-memory database");
    let collaborators = Collaborators {
        bot: bot.clone(),
        identity: BotIdentity::new(BOT_ID, BOT_USERNAME),
        generator: Arc::new(generator),
        briefing: Arc::new(StaticBriefing),
        video: Arc::new(video),
        clock: Arc::new(FixedClock(noon())),
    };
    let components = build_bot_components(&config, repos, collaborators).expect("components");
    Harness { bot, components }
}

/// Stored content tag of a message the bot sent.
pub async fn stored_tag(components: &BotComponents, chat_id: i64, message_id: i64) -> Option<String> {
    components
        .repos
        .messages
        .get_message_by_id(chat_id, message_id)
        .await
        .expect("query")
        .and_then(|r| r.bot_message_type)
}
