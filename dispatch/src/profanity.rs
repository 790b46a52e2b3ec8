//! Profanity counting: per-chat, per-day totals with a running-total notice.

use async_trait::async_trait;
use herald_core::markdown;
use herald_core::{BotContentType, Handler, Message, Result};
use regex::Regex;
use storage::CounterRepository;
use tracing::{error, info, instrument};

use crate::sender::RecordingSender;

/// Word-boundary patterns for Ukrainian profanity, matched against lowercased text with
/// punctuation removed.
const PATTERNS: &[&str] = &[
    r"\bбл[яя]ть\b",
    r"\bху[ййиюяе]\b",
    r"\bп[іие]зд[ауеоіиь]\b",
    r"\b[їие]б[аеи][тть]\b",
    r"\bсук[ауоие]\b",
    r"\bнаху[йяею]\b",
    r"\bдрищ[іауое]?\b",
    r"\bкурв[ауоие]\b",
    r"\bг[іи]мн[оауе]\b",
    r"\bлайн[оауое]\b",
    r"\bпадл[оауе]\b",
    r"\bганд[оо]н[ауоие]?\b",
    r"\bмуд[аа]к[ауоие]?\b",
    r"\bвирод[оо]к[ауоие]?\b",
    r"\bсвол[оо]т[ауоие]\b",
    r"\bгнид[ауоие]\b",
    r"\b[іие]д[іи][оо]т[ауоие]?\b",
    r"\bбовдур[ауоие]?\b",
    r"\bп[іи]дор[ауоие]?\b",
    r"\bху[ййи]л[оауе]\b",
    r"\bпут[іи]н[ауоие]?\b",
    r"\bп[ее][тту]ш[аа]р[уоие]\b",
    r"\bху[ййи]н[яяею]\b",
    r"\bд[ии][бб][іи]л[ауоие]?\b",
    r"\bдаун[ауоие]?\b",
    r"\b[їие]бал[оауое]\b",
    r"\bза[їие]б[аа]в[ауоие]?\b",
    r"\bза[їие]бал[оауое]\b",
    r"\bп[іи]зд[ее]ць\b",
    r"\bєб[аи][тть]\b",
    r"\bйо[ба]ний?\b",
    r"\bтрах[аеи][тть]\b",
    r"\bшмар[ауоие]\b",
    r"\bдристун[ауоие]?\b",
    r"\bчмо[шн]?[ик]?\b",
    r"\bлох[ауоие]?\b",
    r"\bмуд[іи]л[оауое]\b",
    r"\bгандош[ауоие]\b",
    r"\bхер[ауоие]?\b",
    r"\b[ауоие]ху[ййиюяе]\b",
    r"\b[їие]бан[ауоие][ауоие]?\b",
    r"\b[їие]буч[ийаео]\b",
    r"\bбляха\b",
];

/// Compiled pattern set.
pub struct ProfanityMatcher {
    punctuation: Regex,
    patterns: Vec<Regex>,
}

impl ProfanityMatcher {
    pub fn new() -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            punctuation: Regex::new(r"[^\w\s]")?,
            patterns: PATTERNS
                .iter()
                .map(|p| Regex::new(p))
                .collect::<std::result::Result<_, _>>()?,
        })
    }

    /// Sum of all pattern matches in `text`.
    pub fn count(&self, text: &str) -> usize {
        let lowered = text.to_lowercase();
        let cleaned = self.punctuation.replace_all(&lowered, "");
        self.patterns
            .iter()
            .map(|re| re.find_iter(&cleaned).count())
            .sum()
    }
}

/// Counts profanity in before() and replies with the chat's running total for the day.
pub struct ProfanityCounter {
    matcher: ProfanityMatcher,
    counters: CounterRepository,
    sender: RecordingSender,
}

impl ProfanityCounter {
    pub fn new(
        matcher: ProfanityMatcher,
        counters: CounterRepository,
        sender: RecordingSender,
    ) -> Self {
        Self {
            matcher,
            counters,
            sender,
        }
    }

    async fn count_and_report(&self, message: &Message, text: &str) {
        let found = self.matcher.count(text);
        if found == 0 {
            return;
        }

        let date = message.created_at.date_naive();
        let total = match self
            .counters
            .increment(message.chat.id, date, found as i64)
            .await
        {
            Ok(total) => total,
            Err(e) => {
                error!(error = %e, chat_id = message.chat.id, "Failed to increment profanity counter");
                return;
            }
        };
        info!(chat_id = message.chat.id, found, total, "Profanity counted");

        let notice = format!(
            "💩 Profanity counter: {}\\.\nMind your language\\! 😉",
            markdown::bold(&total.to_string())
        );
        if let Err(e) = self
            .sender
            .send_markdown(
                message.chat.id,
                notice,
                BotContentType::SwearCounter,
                Some(message.id),
            )
            .await
        {
            error!(error = %e, chat_id = message.chat.id, "Failed to send profanity notice");
        }
    }
}

#[async_trait]
impl Handler for ProfanityCounter {
    #[instrument(skip(self, message), fields(chat_id = message.chat.id))]
    async fn before(&self, message: &Message) -> Result<bool> {
        if let Some(text) = message.content() {
            self.count_and_report(message, text).await;
        }
        Ok(true)
    }
}
