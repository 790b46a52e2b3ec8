//! [`UpdateRouter`]: the routing step of the handler chain.

use std::sync::Arc;

use async_trait::async_trait;
use herald_core::{BotIdentity, Handler, HandlerResponse, Message, Result};
use storage::MessageRepository;
use tracing::{error, info, instrument, warn};

use crate::route::{classify, is_permitted, Route};

/// Content handlers the router dispatches to. Each handler reports its own failures to the
/// chat; an `Err` here is only logged.
#[async_trait]
pub trait RouteHandlers: Send + Sync {
    async fn forward_translate(&self, message: &Message) -> Result<()>;
    async fn download_video(&self, message: &Message, url: &str) -> Result<()>;
    async fn mention_command(&self, message: &Message, remainder: &str) -> Result<()>;
    async fn continue_reply(&self, message: &Message) -> Result<()>;
    async fn private_conversation(&self, message: &Message) -> Result<()>;
    async fn welcome(&self, message: &Message) -> Result<()>;
    /// Sends the refusal for a gated route in a private chat.
    async fn refuse(&self, message: &Message, route: &Route) -> Result<()>;
}

pub struct UpdateRouter {
    identity: BotIdentity,
    owner_id: i64,
    messages: MessageRepository,
    handlers: Arc<dyn RouteHandlers>,
}

impl UpdateRouter {
    pub fn new(
        identity: BotIdentity,
        owner_id: i64,
        messages: MessageRepository,
        handlers: Arc<dyn RouteHandlers>,
    ) -> Self {
        Self {
            identity,
            owner_id,
            messages,
            handlers,
        }
    }

    /// Stored content tag of the bot message being replied to, if any.
    async fn replied_tag(&self, message: &Message) -> Option<String> {
        let reply = message.reply_to.as_ref()?;
        if reply.from_id != Some(self.identity.id) {
            return None;
        }
        match self
            .messages
            .get_message_by_id(message.chat.id, reply.message_id)
            .await
        {
            Ok(record) => record.and_then(|r| r.bot_message_type),
            Err(e) => {
                warn!(error = %e, reply_to = reply.message_id, "Failed to look up replied message");
                None
            }
        }
    }

    async fn dispatch(&self, message: &Message, route: &Route) -> Result<()> {
        if route.requires_permission()
            && !is_permitted(&message.chat, message.user.id, self.owner_id)
        {
            info!(
                route = route.name(),
                user_id = message.user.id,
                "Route not permitted for this sender in a private chat"
            );
            return self.handlers.refuse(message, route).await;
        }

        match route {
            Route::ForwardTranslate => self.handlers.forward_translate(message).await,
            Route::VideoDownload { url } => self.handlers.download_video(message, url).await,
            Route::MentionCommand { remainder } => {
                self.handlers.mention_command(message, remainder).await
            }
            Route::ReplyContinuation => self.handlers.continue_reply(message).await,
            Route::PrivateConversation => self.handlers.private_conversation(message).await,
            Route::Welcome => self.handlers.welcome(message).await,
            Route::Ignore { .. } => Ok(()),
        }
    }
}

#[async_trait]
impl Handler for UpdateRouter {
    #[instrument(skip(self, message), fields(chat_id = message.chat.id, message_id = message.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let replied_tag = self.replied_tag(message).await;
        let route = classify(message, &self.identity, replied_tag.as_deref());

        if let Route::Ignore { reason } = route {
            info!(reason, user_id = message.user.id, "step: update not routed, no action");
            return Ok(HandlerResponse::Ignore);
        }

        info!(route = route.name(), user_id = message.user.id, "step: update routed");
        if let Err(e) = self.dispatch(message, &route).await {
            error!(error = %e, route = route.name(), "Route handler failed");
        }
        Ok(HandlerResponse::Stop)
    }
}
