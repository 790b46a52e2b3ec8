//! Content jobs: reports, summaries, facts and reminders.
//!
//! Each job is reachable from the scheduler, the manual trigger endpoints, the CLI and (for the
//! summary) a mention command. A failing job still answers in the target chat with an error
//! message tagged for its kind, then returns the error to the caller.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use dispatch::RecordingSender;
use herald_core::{markdown, BotContentType};
use llm_client::ContentGenerator;
use scheduler::Clock;
use storage::{CounterRepository, MessageRepository};
use tracing::{error, info, instrument, warn};

use crate::briefing::{Briefing, BriefingSource};

const NOT_AVAILABLE: &str = "N/A";
const TOP_WORDS_LIMIT: usize = 15;
const MIN_WORD_CHARS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ContentJob {
    MorningReport,
    DailyReport,
    Summary,
    RandomFact,
    HistoryFact,
    CashbackReminder,
    PaymentsReminder,
}

impl ContentJob {
    pub const ALL: [ContentJob; 7] = [
        Self::MorningReport,
        Self::DailyReport,
        Self::Summary,
        Self::RandomFact,
        Self::HistoryFact,
        Self::CashbackReminder,
        Self::PaymentsReminder,
    ];

    /// Job name, also the ledger key base.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MorningReport => "morning_report",
            Self::DailyReport => "daily_report",
            Self::Summary => "ai_summary",
            Self::RandomFact => "random_fact",
            Self::HistoryFact => "history_fact",
            Self::CashbackReminder => "cashback_reminder",
            Self::PaymentsReminder => "payments_reminder",
        }
    }

    /// Path of the manual trigger endpoint.
    pub fn trigger_path(&self) -> &'static str {
        match self {
            Self::MorningReport => "/morning",
            Self::DailyReport => "/daily",
            Self::Summary => "/summary",
            Self::RandomFact => "/fact",
            Self::HistoryFact => "/history_fact",
            Self::CashbackReminder => "/trigger_cashback_reminder",
            Self::PaymentsReminder => "/trigger_payments_reminder",
        }
    }

    /// Older paths still served for the same job.
    pub fn trigger_aliases(&self) -> &'static [&'static str] {
        match self {
            Self::HistoryFact => &["/ukraine_fact"],
            _ => &[],
        }
    }
}

impl fmt::Display for ContentJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContentJob {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|job| job.name() == s)
            .ok_or_else(|| format!("unknown content job: {}", s))
    }
}

pub struct ContentService {
    sender: RecordingSender,
    messages: MessageRepository,
    counters: CounterRepository,
    generator: Arc<dyn ContentGenerator>,
    briefing: Arc<dyn BriefingSource>,
    clock: Arc<dyn Clock>,
}

impl ContentService {
    pub fn new(
        sender: RecordingSender,
        messages: MessageRepository,
        counters: CounterRepository,
        generator: Arc<dyn ContentGenerator>,
        briefing: Arc<dyn BriefingSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sender,
            messages,
            counters,
            generator,
            briefing,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Runs `job` against `chat_id`.
    pub async fn run(&self, job: ContentJob, chat_id: i64) -> Result<()> {
        match job {
            ContentJob::MorningReport => self.morning_report(chat_id).await,
            ContentJob::DailyReport => self.daily_report(chat_id).await,
            ContentJob::Summary => self.ai_summary(chat_id, None).await,
            ContentJob::RandomFact => self.random_fact(chat_id, None).await,
            ContentJob::HistoryFact => self.history_fact(chat_id, None).await,
            ContentJob::CashbackReminder => self.cashback_reminder(chat_id).await,
            ContentJob::PaymentsReminder => self.payments_reminder(chat_id).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn morning_report(&self, chat_id: i64) -> Result<()> {
        info!("step: generating morning report");
        let result: Result<()> = async {
            let briefing = self.briefing.collect().await;
            let text = render_morning_report(self.now(), &briefing);
            self.sender
                .send_markdown(chat_id, text, BotContentType::DailyReport, None)
                .await?;
            Ok(())
        }
        .await;
        self.settle(
            result,
            chat_id,
            None,
            "creating the morning report",
            BotContentType::ReportError,
        )
        .await
    }

    /// Activity report for today, followed by the top words of the day.
    #[instrument(skip(self))]
    pub async fn daily_report(&self, chat_id: i64) -> Result<()> {
        info!("step: generating daily report");
        let result: Result<()> = async {
            let today = self.now().date_naive();
            let stats = self.messages.get_daily_stats(chat_id, today).await?;
            let profanity = self.counters.get(chat_id, today).await?;
            let texts = self.messages.get_human_messages_for_day(chat_id, today).await?;

            let mut report = format!(
                "📊 Report for {}\\:\n\nTotal messages in the chat\\: {}\n\n{}\\:\n\n",
                markdown::bold(&today.format("%d.%m.%Y").to_string()),
                markdown::bold(&stats.total_messages.to_string()),
                markdown::bold("Top-5 most active experts"),
            );
            if stats.top_users.is_empty() {
                report.push_str("No active users besides the bot\\.\n");
            } else {
                for user in &stats.top_users {
                    report.push_str(&format!(
                        "• {}\\: {} messages\n",
                        markdown::escape(user.username.as_deref().unwrap_or(prompt::UNKNOWN_USER)),
                        markdown::bold(&user.message_count.to_string()),
                    ));
                }
            }
            report.push_str(&format!(
                "\nBot activity\\: {} messages\n\n😡 Profanity detected today\\: {}\\.\nMind your language\\! 😉",
                markdown::bold(&stats.bot_messages.to_string()),
                markdown::bold(&profanity.to_string()),
            ));
            self.sender
                .send_markdown(chat_id, report, BotContentType::DailyReport, None)
                .await?;

            let words = top_words(texts.iter().map(|(_, text)| text.as_str()), TOP_WORDS_LIMIT);
            if words.is_empty() {
                self.sender
                    .send_markdown(
                        chat_id,
                        "⚠️ Not enough messages for the word cloud\\.",
                        BotContentType::WordcloudNoData,
                        None,
                    )
                    .await?;
            } else {
                let cloud = words
                    .iter()
                    .map(|(word, count)| format!("{} \\({}\\)", markdown::escape(word), count))
                    .collect::<Vec<_>>()
                    .join(" · ");
                self.sender
                    .send_markdown(
                        chat_id,
                        format!("🌈 {}\n\n{}", markdown::bold("Word cloud of the day"), cloud),
                        BotContentType::WordcloudImage,
                        None,
                    )
                    .await?;
            }
            Ok(())
        }
        .await;
        self.settle(
            result,
            chat_id,
            None,
            "creating the daily report",
            BotContentType::ReportError,
        )
        .await
    }

    /// Summary of today's human messages in `chat_id`.
    #[instrument(skip(self))]
    pub async fn ai_summary(&self, chat_id: i64, reply_to: Option<i64>) -> Result<()> {
        info!("step: generating summary");
        let result: Result<()> = async {
            let today = self.now().date_naive();
            let lines = self.messages.get_human_messages_for_day(chat_id, today).await?;
            let summary = self.generator.summarize(&lines).await?;
            let text = format!(
                "💬 {}\n\n{}",
                markdown::bold("Summary of the day:"),
                markdown::escape(&summary)
            );
            self.sender
                .send_markdown(chat_id, text, BotContentType::AiSummary, reply_to)
                .await?;
            Ok(())
        }
        .await;
        self.settle(
            result,
            chat_id,
            reply_to,
            "creating the summary",
            BotContentType::SummaryError,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn random_fact(&self, chat_id: i64, reply_to: Option<i64>) -> Result<()> {
        let result: Result<()> = async {
            let fact = self.generator.random_fact().await?;
            let text = format!(
                "🧐 {}\n\n{}",
                markdown::bold("Interesting fact:"),
                markdown::escape(&fact)
            );
            self.sender
                .send_markdown(chat_id, text, BotContentType::RandomFact, reply_to)
                .await?;
            Ok(())
        }
        .await;
        self.settle(
            result,
            chat_id,
            reply_to,
            "getting the fact",
            BotContentType::FactError,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn history_fact(&self, chat_id: i64, reply_to: Option<i64>) -> Result<()> {
        let result: Result<()> = async {
            let fact = self.generator.history_fact().await?;
            let text = format!(
                "📚 {}\n\n{}",
                markdown::bold("Learn your history:"),
                markdown::escape(&fact)
            );
            self.sender
                .send_markdown(chat_id, text, BotContentType::HistoryFact, reply_to)
                .await?;
            Ok(())
        }
        .await;
        self.settle(
            result,
            chat_id,
            reply_to,
            "getting the historical fact",
            BotContentType::FactError,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn cashback_reminder(&self, chat_id: i64) -> Result<()> {
        let text = format!(
            "💸 {}\n\n{}",
            markdown::bold("Cashback!"),
            markdown::escape(
                "Don't forget to enable cashback in your favourite categories this month! 😉"
            )
        );
        let result = self
            .sender
            .send_markdown(chat_id, text, BotContentType::CashbackReminder, None)
            .await
            .map(|_| ())
            .map_err(anyhow::Error::from);
        self.settle(
            result,
            chat_id,
            None,
            "sending the cashback reminder",
            BotContentType::ReminderError,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn payments_reminder(&self, chat_id: i64) -> Result<()> {
        let text = format!(
            "💳 {}\n\n{}",
            markdown::bold("Last day of the month!"),
            markdown::escape("Don't forget to pay for the internet and other monthly services.")
        );
        let result = self
            .sender
            .send_markdown(chat_id, text, BotContentType::MonthlyPaymentsReminder, None)
            .await
            .map(|_| ())
            .map_err(anyhow::Error::from);
        self.settle(
            result,
            chat_id,
            None,
            "sending the payments reminder",
            BotContentType::ReminderError,
        )
        .await
    }

    /// Passes success through; on failure tells the chat what went wrong and returns the error.
    async fn settle(
        &self,
        result: Result<()>,
        chat_id: i64,
        reply_to: Option<i64>,
        action: &str,
        error_tag: BotContentType,
    ) -> Result<()> {
        let Err(e) = result else {
            info!(chat_id, "step: content sent");
            return Ok(());
        };
        error!(chat_id, error = %e, action, "Content job failed");
        let notice = format!(
            "An error occurred while {}\\: {}",
            markdown::escape(action),
            markdown::escape(&e.to_string())
        );
        if let Err(send_err) = self
            .sender
            .send_markdown(chat_id, notice, error_tag, reply_to)
            .await
        {
            warn!(chat_id, error = %send_err, "Failed to report content error to the chat");
        }
        Err(e)
    }
}

/// Greeting, date, weather, USD rate, Bitcoin and news; missing pieces render as `N/A`.
pub fn render_morning_report(now: DateTime<Utc>, briefing: &Briefing) -> String {
    let mut text = format!(
        "{}\n\n{}\n\n🌤️ Weather today\\:\n",
        markdown::bold("Good morning, dear experts!"),
        markdown::bold(&now.format("%A (%d.%m.%Y)").to_string()),
    );
    for city in &briefing.weather {
        text.push_str(&format!(
            " • {}\\: {}\n",
            markdown::escape(&city.city),
            markdown::escape(city.temperature.as_deref().unwrap_or(NOT_AVAILABLE)),
        ));
    }

    let usd = briefing
        .usd_rate
        .as_ref()
        .map(|rate| format!("{} UAH", rate))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    text.push_str(&format!(
        "\n💱 Official NBU USD rate\\: {}\n",
        markdown::escape(&usd)
    ));

    let bitcoin = match &briefing.bitcoin {
        Some(quote) if quote.change.is_empty() => format!("1 BTC = {}", quote.price),
        Some(quote) => format!("1 BTC = {} ({})", quote.price, quote.change),
        None => NOT_AVAILABLE.to_string(),
    };
    text.push_str(&format!("🪙 Bitcoin\\: {}\n\n", markdown::escape(&bitcoin)));

    match &briefing.news {
        Some(titles) => {
            text.push_str("📰 Most important news since yesterday\\:\n");
            for (i, title) in titles.iter().enumerate() {
                text.push_str(&format!("{}\\. {}\n", i + 1, markdown::escape(title)));
            }
        }
        None => text.push_str("📰 News unavailable\\.\n"),
    }

    text.push_str("\nHave a good and peaceful day\\! ✌️");
    text
}

/// Most frequent words of at least four letters, most frequent first, ties alphabetical.
pub fn top_words<'a>(texts: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            if word.chars().count() >= MIN_WORD_CHARS && !word.chars().all(char::is_numeric) {
                *counts.entry(word.to_lowercase()).or_default() += 1;
            }
        }
    }
    let mut words: Vec<(String, usize)> = counts.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.truncate(limit);
    words
}
