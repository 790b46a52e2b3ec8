//! Recording [`herald_core::Bot`] that can be told to fail for one chat.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use herald_core::{Bot, DbotError, OutgoingContent, Result, TextFormat};

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SentRecord {
    pub chat_id: i64,
    pub text: Option<String>,
}

pub struct MockBot {
    next_id: AtomicI64,
    failing_chat: Option<i64>,
    sent: Mutex<Vec<SentRecord>>,
}

#[allow(dead_code)]
impl MockBot {
    pub fn new() -> Arc<Self> {
        Self::failing_for(None)
    }

    /// Every send to `chat_id` returns an error.
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
}

#[async_trait]
impl Bot for MockBot {
    async fn send(
        &self,
        chat_id: i64,
        content: OutgoingContent,
        _format: TextFormat,
        _reply_to: Option<i64>,
    ) -> Result<i64> {
        if self.failing_chat == Some(chat_id) {
            return Err(DbotError::Bot("chat not found".to_string()));
        }
        self.sent.lock().unwrap().push(SentRecord {
            chat_id,
            text: content.text().map(str::to_string),
        });
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}
