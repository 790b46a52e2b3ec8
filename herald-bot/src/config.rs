//! Bot config: Telegram connection, storage, LLM, scheduling and HTTP surface. Loaded from env.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use llm_client::LlmSettings;

const DEFAULT_RAPIDAPI_HOST: &str = "social-download-all-in-one.p.rapidapi.com";

#[derive(Debug, Clone)]
pub struct BotConfig {
    /// BOT_TOKEN (or TELEGRAM_BOT_TOKEN)
    pub bot_token: String,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    pub database_url: String,
    pub log_file: String,
    pub llm: LlmSettings,
    /// Group that receives scheduled content and forwarded news.
    pub report_chat_id: i64,
    /// The only user served in private chats; 0 means nobody.
    pub owner_user_id: i64,
    pub webhook_base_url: Option<String>,
    pub webhook_path: String,
    pub listen_addr: String,
    pub rapidapi_key: String,
    pub rapidapi_host: String,
    pub idempotency_window: Duration,
    pub scheduler_poll: Duration,
    pub announcement_sweep: Duration,
    pub max_concurrent_updates: usize,
    /// Bound on every outbound collaborator call (scraping, video resolver).
    pub http_timeout: Duration,
    pub translate_target_language: String,
}

impl BotConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN")
                .or_else(|_| env::var("TELEGRAM_BOT_TOKEN"))
                .context("BOT_TOKEN not set")?,
        };
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();

        Ok(Self {
            bot_token,
            telegram_api_url,
            database_url,
            log_file: env_or("LOG_FILE", "logs/herald.log"),
            llm: LlmSettings::from_env(),
            report_chat_id: parse_env_or("REPORT_CHAT_ID", parse_env_or("CHAT_ID", 0)?)?,
            owner_user_id: parse_env_or("OWNER_USER_ID", 0)?,
            webhook_base_url: env::var("WEBHOOK_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            webhook_path: env_or("WEBHOOK_PATH", "/webhook"),
            listen_addr: env_or("LISTEN_ADDR", "0.0.0.0:8080"),
            rapidapi_key: env::var("RAPIDAPI_KEY").unwrap_or_default(),
            rapidapi_host: env_or("RAPIDAPI_HOST", DEFAULT_RAPIDAPI_HOST),
            idempotency_window: Duration::from_secs(parse_env_or("IDEMPOTENCY_WINDOW_SECS", 60)?),
            scheduler_poll: Duration::from_secs(parse_env_or("SCHEDULER_POLL_SECS", 30)?),
            announcement_sweep: Duration::from_secs(parse_env_or("ANNOUNCEMENT_SWEEP_SECS", 300)?),
            max_concurrent_updates: parse_env_or("MAX_CONCURRENT_UPDATES", 32)?,
            http_timeout: Duration::from_secs(parse_env_or("HTTP_TIMEOUT_SECS", 30)?),
            translate_target_language: env_or("TRANSLATE_TARGET_LANGUAGE", "Ukrainian"),
        })
    }

    /// Validate config before anything is started.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            bail!("BOT_TOKEN is empty");
        }
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        if let Some(ref url_str) = self.webhook_base_url {
            if reqwest::Url::parse(url_str).is_err() {
                bail!("WEBHOOK_BASE_URL is set but not a valid URL: {}", url_str);
            }
        }
        if !self.webhook_path.starts_with('/') {
            bail!("WEBHOOK_PATH must start with '/': {}", self.webhook_path);
        }
        if SocketAddr::from_str(&self.listen_addr).is_err() {
            bail!("LISTEN_ADDR is not a socket address: {}", self.listen_addr);
        }
        if self.idempotency_window.is_zero()
            || self.scheduler_poll.is_zero()
            || self.announcement_sweep.is_zero()
        {
            bail!("IDEMPOTENCY_WINDOW_SECS, SCHEDULER_POLL_SECS and ANNOUNCEMENT_SWEEP_SECS must be positive");
        }
        if self.max_concurrent_updates == 0 {
            bail!("MAX_CONCURRENT_UPDATES must be positive");
        }
        Ok(())
    }

    /// Full webhook URL, when a public base URL is configured.
    pub fn webhook_url(&self) -> Option<String> {
        self.webhook_base_url
            .as_ref()
            .map(|base| format!("{}{}", base.trim_end_matches('/'), self.webhook_path))
    }

    /// RapidAPI autolink endpoint on the configured host.
    pub fn rapidapi_endpoint(&self) -> String {
        format!("https://{}/v1/social/autolink", self.rapidapi_host)
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parses `name` when set; a value that does not parse is a startup error.
fn parse_env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", name, raw, e)),
        _ => Ok(default),
    }
}
