//! Handler that stores every inbound message before routing.

use async_trait::async_trait;
use herald_core::{Handler, Message, Result};
use storage::{MessageRecord, MessageRepository};
use tracing::{error, info, instrument};

/// Upserts each incoming message in before(). A storage failure is logged and the chain
/// continues; routing must not depend on persistence.
#[derive(Clone)]
pub struct PersistenceHandler {
    repo: MessageRepository,
}

impl PersistenceHandler {
    pub fn new(repo: MessageRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Handler for PersistenceHandler {
    #[instrument(skip(self, message))]
    async fn before(&self, message: &Message) -> Result<bool> {
        let record = MessageRecord::new(
            message.id,
            message.chat.id,
            message.user.id,
            message.user.username.clone(),
            message.content().map(str::to_string),
        )
        .with_timestamp(message.created_at);

        match self.repo.upsert(&record).await {
            Ok(()) => info!(
                user_id = message.user.id,
                chat_id = message.chat.id,
                message_id = message.id,
                "step: PersistenceHandler before done, message saved"
            ),
            Err(e) => error!(
                error = %e,
                chat_id = message.chat.id,
                message_id = message.id,
                "Failed to save message"
            ),
        }
        Ok(true)
    }
}
