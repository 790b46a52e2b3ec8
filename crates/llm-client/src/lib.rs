//! # LLM client abstraction
//!
//! [`LlmClient`] sends a message list to a model; [`OpenAILlmClient`] implements it over
//! openai-client. [`ContentGenerator`] is what the bot calls: summaries, expert answers,
//! translations and facts, each with its own token budget. [`LlmContentGenerator`] implements it
//! on any [`LlmClient`].

use anyhow::Result;
use async_trait::async_trait;
use openai_client::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};
use prompt::{ChatMessage, MessageRole};

mod config;
mod generator;
mod openai_llm;

pub use config::{LlmSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use generator::{ContentGenerator, LlmContentGenerator, NO_MESSAGES_FOR_SUMMARY};
pub use openai_client::CompletionOptions;
pub use openai_llm::OpenAILlmClient;

/// Sends a message list to a model and returns the reply text.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>, options: CompletionOptions)
        -> Result<String>;
}

/// Converts a single [`ChatMessage`] into OpenAI API message format.
fn chat_message_to_openai(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let content = msg.content.clone();
    let openai_msg: ChatCompletionRequestMessage = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    };
    Ok(openai_msg)
}
