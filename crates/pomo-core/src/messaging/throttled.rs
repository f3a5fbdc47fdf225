use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::port::MessagingPort,
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between any two outbound sends.
    pub global_min_interval: Duration,
    /// Minimum spacing between sends to the same chat.
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40),
            per_chat_min_interval: Duration::from_millis(1050),
        }
    }
}

/// Earliest instant each send slot opens.
///
/// Only chats whose next slot is still in the future are remembered; a chat
/// whose slot has passed would be allowed to send immediately anyway.
#[derive(Debug)]
struct Pacing {
    global_next: Instant,
    chats: HashMap<ChatId, Instant>,
}

impl Pacing {
    /// Book the next slot for `chat_id` and return how long to wait for it.
    fn book(&mut self, chat_id: ChatId, cfg: &ThrottleConfig, now: Instant) -> Duration {
        if !self.chats.contains_key(&chat_id) {
            self.chats.retain(|_, next| *next > now);
        }

        let chat_next = self.chats.get(&chat_id).copied().unwrap_or(now);
        let start = now.max(self.global_next).max(chat_next);

        self.global_next = start + cfg.global_min_interval;
        self.chats.insert(chat_id, start + cfg.per_chat_min_interval);
        start - now
    }
}

/// MessagingPort decorator that paces outbound sends.
///
/// Phase notices for many chats can land in the same second; this keeps the
/// burst under the platform's flood limits. It does not guarantee zero 429s.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    pacing: Mutex<Pacing>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            pacing: Mutex::new(Pacing {
                global_next: Instant::now(),
                chats: HashMap::new(),
            }),
        }
    }

    async fn wait_for_slot(&self, chat_id: ChatId) {
        let wait = self
            .pacing
            .lock()
            .await
            .book(chat_id, &self.cfg, Instant::now());
        if !wait.is_zero() {
            tracing::trace!(chat_id = chat_id.0, ?wait, "pacing outbound send");
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.wait_for_slot(chat_id).await;
        self.inner.send_html(chat_id, html).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;

    #[derive(Default)]
    struct RecordingMessenger {
        sent_at: std::sync::Mutex<Vec<(ChatId, Instant)>>,
    }

    #[async_trait::async_trait]
    impl MessagingPort for RecordingMessenger {
        async fn send_html(&self, chat_id: ChatId, _html: &str) -> Result<MessageRef> {
            self.sent_at.lock().unwrap().push((chat_id, Instant::now()));
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(1),
            })
        }
    }

    fn throttled() -> (ThrottledMessenger, Arc<RecordingMessenger>) {
        let inner = Arc::new(RecordingMessenger::default());
        (
            ThrottledMessenger::new(inner.clone(), ThrottleConfig::default()),
            inner,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn spaces_sends_to_the_same_chat() {
        let (throttled, inner) = throttled();

        let t0 = Instant::now();
        throttled.send_html(ChatId(1), "a").await.unwrap();
        throttled.send_html(ChatId(1), "b").await.unwrap();

        let sent = inner.sent_at.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1, t0);
        assert!(sent[1].1 - t0 >= Duration::from_millis(1050));
    }

    #[tokio::test(start_paused = true)]
    async fn different_chats_only_pay_the_global_interval() {
        let (throttled, inner) = throttled();

        let t0 = Instant::now();
        throttled.send_html(ChatId(1), "a").await.unwrap();
        throttled.send_html(ChatId(2), "b").await.unwrap();

        let sent = inner.sent_at.lock().unwrap().clone();
        let gap = sent[1].1 - t0;
        assert!(gap >= Duration::from_millis(40));
        assert!(gap < Duration::from_millis(1050));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_chats_are_forgotten() {
        let (throttled, _inner) = throttled();

        for id in 0..500 {
            throttled.send_html(ChatId(id), "x").await.unwrap();
        }
        // Only chats inside their per-chat window are still tracked.
        let tracked = throttled.pacing.lock().await.chats.len();
        assert!(tracked > 1 && tracked <= 30, "tracked {tracked}");

        sleep(Duration::from_secs(3600)).await;
        throttled.send_html(ChatId(10_000), "x").await.unwrap();

        assert_eq!(throttled.pacing.lock().await.chats.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn chats_still_being_paced_are_kept() {
        let (throttled, inner) = throttled();

        throttled.send_html(ChatId(1), "a").await.unwrap();
        throttled.send_html(ChatId(2), "b").await.unwrap();
        assert_eq!(throttled.pacing.lock().await.chats.len(), 2);

        // Chat 1 is still inside its window, so its pacing carries over.
        throttled.send_html(ChatId(1), "c").await.unwrap();
        let sent = inner.sent_at.lock().unwrap().clone();
        assert!(sent[2].1 - sent[0].1 >= Duration::from_millis(1050));
    }
}
