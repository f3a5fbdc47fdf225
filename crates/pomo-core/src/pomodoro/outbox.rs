//! Ordered per-chat delivery of notices.
//!
//! Notices are queued while the manager still holds its state lock, so a
//! chat's queue order is the order its transitions happened. Each non-empty
//! queue has exactly one drain task; a chat's queue entry is removed once it
//! runs dry.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use crate::{domain::ChatId, messaging::port::MessagingPort};

pub(crate) struct Outbox {
    notifier: Arc<dyn MessagingPort>,
    queues: Mutex<HashMap<ChatId, VecDeque<String>>>,
}

impl Outbox {
    pub(crate) fn new(notifier: Arc<dyn MessagingPort>) -> Arc<Self> {
        Arc::new(Self {
            notifier,
            queues: Mutex::new(HashMap::new()),
        })
    }

    /// Queue `text` behind the chat's earlier notices. Must be called inside a
    /// tokio runtime.
    pub(crate) fn push(self: &Arc<Self>, chat_id: ChatId, text: String) {
        let start_drain = {
            let mut queues = self.queues.lock().unwrap_or_else(|e| e.into_inner());
            let queue = queues.entry(chat_id).or_default();
            queue.push_back(text);
            queue.len() == 1
        };

        if start_drain {
            let outbox = Arc::clone(self);
            tokio::spawn(async move { outbox.drain(chat_id).await });
        }
    }

    async fn drain(self: Arc<Self>, chat_id: ChatId) {
        loop {
            let Some(text) = self.front(chat_id) else {
                return;
            };

            // Failures are logged and the notice dropped; the session has
            // already moved on.
            if let Err(e) = self.notifier.send_html(chat_id, &text).await {
                tracing::warn!(chat_id = chat_id.0, error = %e, "failed to deliver notification");
            }

            let mut queues = self.queues.lock().unwrap_or_else(|e| e.into_inner());
            let Some(queue) = queues.get_mut(&chat_id) else {
                return;
            };
            queue.pop_front();
            if queue.is_empty() {
                queues.remove(&chat_id);
                return;
            }
        }
    }

    fn front(&self, chat_id: ChatId) -> Option<String> {
        let queues = self.queues.lock().unwrap_or_else(|e| e.into_inner());
        queues.get(&chat_id).and_then(|q| q.front().cloned())
    }

    #[cfg(test)]
    pub(crate) fn pending_chats(&self) -> usize {
        self.queues.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
