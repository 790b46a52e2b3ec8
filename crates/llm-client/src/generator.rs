//! The generation tasks the bot needs, each with its own budget.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use openai_client::CompletionOptions;
use prompt::{ChatMessage, EXPERT_ROLES};
use rand::seq::SliceRandom;
use tracing::{info, instrument};

use crate::LlmClient;

pub const NO_MESSAGES_FOR_SUMMARY: &str = "No messages available for summary.";

const SUMMARY: CompletionOptions = CompletionOptions {
    max_tokens: Some(300),
    temperature: Some(0.8),
};
const EXPERT: CompletionOptions = CompletionOptions {
    max_tokens: Some(180),
    temperature: Some(0.8),
};
const TRANSLATION: CompletionOptions = CompletionOptions {
    max_tokens: Some(500),
    temperature: None,
};
const RANDOM_FACT: CompletionOptions = CompletionOptions {
    max_tokens: Some(100),
    temperature: Some(0.9),
};
const HISTORY_FACT: CompletionOptions = CompletionOptions {
    max_tokens: Some(150),
    temperature: Some(0.8),
};

/// Text generation used by content handlers and jobs. Every method fails with `Err` instead of
/// returning error prose; callers decide how to tell the user.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Digest of `(username, text)` lines. An empty slice yields [`NO_MESSAGES_FOR_SUMMARY`]
    /// without calling the model.
    async fn summarize(&self, lines: &[(Option<String>, String)]) -> Result<String>;

    /// Short in-character answer to `question` given the recent chat `history`.
    async fn expert_answer(&self, history: Vec<ChatMessage>, question: &str) -> Result<String>;

    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;

    async fn random_fact(&self) -> Result<String>;

    async fn history_fact(&self) -> Result<String>;
}

/// [`ContentGenerator`] on top of an [`LlmClient`], with a random persona per summary and answer.
pub struct LlmContentGenerator {
    client: Arc<dyn LlmClient>,
}

impl LlmContentGenerator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    fn pick_role() -> &'static str {
        EXPERT_ROLES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(EXPERT_ROLES[0])
    }

    async fn generate(
        &self,
        task: &'static str,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<String> {
        let text = self
            .client
            .complete(messages, options)
            .await
            .with_context(|| format!("{} generation failed", task))?;
        let text = text.trim();
        if text.is_empty() {
            anyhow::bail!("{} generation returned no text", task);
        }
        info!(task, chars = text.chars().count(), "step: content generated");
        Ok(text.to_string())
    }
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    async fn summarize(&self, lines: &[(Option<String>, String)]) -> Result<String> {
        if lines.is_empty() {
            return Ok(NO_MESSAGES_FOR_SUMMARY.to_string());
        }
        let role = Self::pick_role();
        let messages = prompt::summary_messages(
            role,
            lines
                .iter()
                .map(|(user, text)| (user.as_deref(), text.as_str())),
        );
        self.generate("summary", messages, SUMMARY).await
    }

    #[instrument(skip(self, history, question), fields(history = history.len()))]
    async fn expert_answer(&self, history: Vec<ChatMessage>, question: &str) -> Result<String> {
        let messages = prompt::expert_messages(Self::pick_role(), history, question);
        self.generate("expert answer", messages, EXPERT).await
    }

    #[instrument(skip(self, text))]
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let messages = prompt::translation_messages(text, target_language);
        self.generate("translation", messages, TRANSLATION).await
    }

    async fn random_fact(&self) -> Result<String> {
        self.generate("random fact", prompt::random_fact_messages(), RANDOM_FACT)
            .await
    }

    async fn history_fact(&self) -> Result<String> {
        self.generate("history fact", prompt::history_fact_messages(), HISTORY_FACT)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prompt::MessageRole;
    use std::sync::Mutex;

    /// Records every request and answers with a fixed reply.
    struct ScriptedClient {
        reply: Result<String, String>,
        calls: Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>,
    }

    impl ScriptedClient {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(error: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(error.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            options: CompletionOptions,
        ) -> Result<String> {
            self.calls.lock().unwrap().push((messages, options));
            self.reply.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    /// **Test: An empty day is summarised without calling the model.**
    #[tokio::test]
    async fn test_empty_summary_skips_model() {
        let client = ScriptedClient::replying("unused");
        let generator = LlmContentGenerator::new(client.clone());

        let text = generator.summarize(&[]).await.unwrap();

        assert_eq!(text, NO_MESSAGES_FOR_SUMMARY);
        assert!(client.calls.lock().unwrap().is_empty());
    }

    /// **Test: Summary uses a persona from the roster, one user turn per line, 300 tokens at 0.8.**
    #[tokio::test]
    async fn test_summary_request_shape() {
        let client = ScriptedClient::replying("  1. Weather talk  ");
        let generator = LlmContentGenerator::new(client.clone());
        let lines = vec![
            (Some("olena".to_string()), "rain again".to_string()),
            (None, "yes".to_string()),
        ];

        let text = generator.summarize(&lines).await.unwrap();
        assert_eq!(text, "1. Weather talk");

        let calls = client.calls.lock().unwrap();
        let (messages, options) = &calls[0];
        assert_eq!(*options, SUMMARY);
        assert_eq!(messages.len(), 3);
        assert!(EXPERT_ROLES
            .iter()
            .any(|role| messages[0].content.starts_with(role)));
        assert_eq!(messages[1].content, "olena: rain again");
    }

    /// **Test: Expert answers put history before the question and use the 180-token budget.**
    #[tokio::test]
    async fn test_expert_answer_request_shape() {
        let client = ScriptedClient::replying("Because of Rayleigh scattering.");
        let generator = LlmContentGenerator::new(client.clone());
        let history = vec![ChatMessage::assistant("Earlier.")];

        generator
            .expert_answer(history, "Why is the sky blue?")
            .await
            .unwrap();

        let calls = client.calls.lock().unwrap();
        let (messages, options) = &calls[0];
        assert_eq!(*options, EXPERT);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages.last().unwrap().content, "Why is the sky blue?");
    }

    #[tokio::test]
    async fn test_fact_budgets() {
        let client = ScriptedClient::replying("Octopuses have three hearts.");
        let generator = LlmContentGenerator::new(client.clone());

        generator.random_fact().await.unwrap();
        generator.history_fact().await.unwrap();
        generator.translate("Hello", "Ukrainian").await.unwrap();

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls[0].1, RANDOM_FACT);
        assert_eq!(calls[1].1, HISTORY_FACT);
        assert_eq!(calls[2].1, TRANSLATION);
    }

    /// **Test: Model failures and blank replies are errors, never text to post.**
    #[tokio::test]
    async fn test_failures_are_errors() {
        let generator = LlmContentGenerator::new(ScriptedClient::failing("timeout"));
        let err = generator.random_fact().await.unwrap_err();
        assert!(format!("{:#}", err).contains("timeout"));

        let blank = LlmContentGenerator::new(ScriptedClient::replying("   "));
        assert!(blank.history_fact().await.is_err());
    }
}
