//! Bot abstraction for sending messages.
//!
//! [`Bot`] is transport-agnostic; herald-telegram implements it via teloxide and tests substitute
//! a recording mock.

use async_trait::async_trait;

use crate::error::Result;

/// How the platform should interpret text and captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    MarkdownV2,
}

/// A media payload: either a platform file id or raw bytes to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    FileId(String),
    Bytes { data: Vec<u8>, file_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingContent {
    Text(String),
    Photo {
        source: MediaSource,
        caption: Option<String>,
    },
    Video {
        source: MediaSource,
        caption: Option<String>,
    },
}

impl OutgoingContent {
    /// Text or caption; what gets persisted for this message.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Photo { caption, .. } | Self::Video { caption, .. } => caption.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    UploadVideo,
}

/// Sends content to a chat. Implementations map to a transport (e.g. Telegram).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends `content` to `chat_id`, optionally as a reply, and returns the new message id.
    async fn send(
        &self,
        chat_id: i64,
        content: OutgoingContent,
        format: TextFormat,
        reply_to: Option<i64>,
    ) -> Result<i64>;

    /// Shows a transient status ("typing…") in the chat. Failures are not interesting to callers.
    async fn send_chat_action(&self, _chat_id: i64, _action: ChatAction) -> Result<()> {
        Ok(())
    }
}
