//! Mock implementation of [`herald_core::Bot`] for integration tests.
//!
//! Records every `send` so tests can assert on chat, text and reply target without a network.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use herald_core::{Bot, OutgoingContent, Result, TextFormat};

/// One recorded call to `send`.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SentRecord {
    pub chat_id: i64,
    pub content: OutgoingContent,
    pub format: TextFormat,
    pub reply_to: Option<i64>,
    pub message_id: i64,
}

/// Returns increasing message ids starting at 1000.
pub struct MockBot {
    next_id: AtomicI64,
    sent: Mutex<Vec<SentRecord>>,
}

#[allow(dead_code)]
impl MockBot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicI64::new(1000),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<SentRecord> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|r| r.content.text().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send(
        &self,
        chat_id: i64,
        content: OutgoingContent,
        format: TextFormat,
        reply_to: Option<i64>,
    ) -> Result<i64> {
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(SentRecord {
            chat_id,
            content,
            format,
            reply_to,
            message_id,
        });
        Ok(message_id)
    }
}
