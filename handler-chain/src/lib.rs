//! # Handler chain
//!
//! Runs every handler's `before` hook in order, then the handle phase until a handler returns
//! Stop or Reply, then every `after` hook in reverse order. Side effects that must happen for
//! every message (persistence, profanity counting) live in `before`; routing lives in `handle`.

use herald_core::{Handler, HandlerResponse, Message, Result};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Ordered list of handlers sharing one message.
#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn Handler>>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler (before runs in insertion order, after in reverse).
    pub fn add_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the three phases and returns the first Stop or Reply, or Continue.
    #[instrument(skip(self, message), fields(chat_id = message.chat.id, message_id = message.id))]
    pub async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        info!(
            user_id = message.user.id,
            chat_id = message.chat.id,
            message_id = message.id,
            "step: handler_chain started"
        );

        for handler in &self.handlers {
            let name = std::any::type_name_of_val(handler.as_ref());
            debug!(handler = %name, "step: handler before");
            if !handler.before(message).await? {
                info!(handler = %name, "step: handler before returned false, chain stopped");
                return Ok(HandlerResponse::Stop);
            }
        }

        let mut final_response = HandlerResponse::Continue;
        for handler in &self.handlers {
            let name = std::any::type_name_of_val(handler.as_ref());
            let response = handler.handle(message).await?;
            debug!(handler = %name, response = ?response, "step: handler done");

            match response {
                HandlerResponse::Stop | HandlerResponse::Reply(_) => {
                    info!(handler = %name, "step: handler chain stopped by handler");
                    final_response = response;
                    break;
                }
                HandlerResponse::Continue | HandlerResponse::Ignore => continue,
            }
        }

        for handler in self.handlers.iter().rev() {
            handler.after(message, &final_response).await?;
        }

        info!(
            chat_id = message.chat.id,
            message_id = message.id,
            "step: handler_chain finished"
        );
        Ok(final_response)
    }
}

// Integration tests live in tests/handler_chain_test.rs
