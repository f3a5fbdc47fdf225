//! Telegram adapter (teloxide).
//!
//! This crate implements the `pomo-core` MessagingPort over Telegram Bot API
//! and routes `pomo` commands into the core.

use std::time::Duration;

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode, ApiError, RequestError};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use pomo_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::port::MessagingPort,
    Result,
};

/// Flood-limit replies honoured per send before giving up.
const FLOOD_RETRIES: usize = 1;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Send `text` once, waiting out at most [`FLOOD_RETRIES`] flood-limit
    /// replies.
    async fn deliver(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> std::result::Result<Message, RequestError> {
        let mut floods = 0;
        loop {
            let mut req = self
                .bot
                .send_message(teloxide::types::ChatId(chat_id.0), text.to_string());
            if let Some(mode) = parse_mode {
                req = req.parse_mode(mode);
            }

            match req.await {
                Err(e) if floods < FLOOD_RETRIES => match flood_delay(&e) {
                    Some(delay) => {
                        floods += 1;
                        tracing::warn!(chat_id = chat_id.0, ?delay, "telegram flood limit hit, retrying");
                        sleep(delay).await;
                    }
                    None => return Err(e),
                },
                other => return other,
            }
        }
    }
}

fn flood_delay(e: &RequestError) -> Option<Duration> {
    match e {
        RequestError::RetryAfter(delay) => Some(*delay),
        _ => None,
    }
}

/// Telegram rejected the message's HTML entities.
fn is_markup_error(e: &RequestError) -> bool {
    matches!(e, RequestError::Api(ApiError::CantParseEntities))
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    /// Sends as HTML; if Telegram cannot parse the markup the text goes out
    /// again without a parse mode rather than being lost.
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let sent = match self.deliver(chat_id, html, Some(ParseMode::Html)).await {
            Err(e) if is_markup_error(&e) => {
                tracing::warn!(chat_id = chat_id.0, error = %e, "html rejected, sending as plain text");
                self.deliver(chat_id, html, None).await
            }
            other => other,
        };
        let msg = sent.map_err(|e| Error::External(format!("telegram error: {e}")))?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }
}
