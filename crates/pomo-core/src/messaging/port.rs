use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    Result,
};

/// Cross-messenger port.
///
/// This is the notifier the pomodoro engine talks to. Telegram is the first
/// implementation; other adapters fit behind the same interface.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;
}
