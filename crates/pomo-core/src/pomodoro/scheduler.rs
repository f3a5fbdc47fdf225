//! One pending timer per chat.
//!
//! Arming a chat cancels whatever was pending for it first ("replace, never
//! accumulate"). Expired timers are not acted on here: they are delivered as
//! [`Fire`] events to the manager's driving loop, which must [`Scheduler::claim`]
//! them. A fire whose generation no longer matches the chat's slot was
//! superseded by a later `arm`/`cancel` and is dropped.

use std::{collections::HashMap, time::Duration};

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::domain::ChatId;

/// An expired timer, tagged with the generation it was armed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fire {
    pub chat_id: ChatId,
    pub generation: u64,
}

struct TimerSlot {
    generation: u64,
    cancel: CancellationToken,
}

pub struct Scheduler {
    slots: HashMap<ChatId, TimerSlot>,
    // Shared by all chats so a chat's generation keeps increasing even after
    // its slot is dropped and re-created.
    next_generation: u64,
    fires: mpsc::UnboundedSender<Fire>,
}

impl Scheduler {
    pub fn new(fires: mpsc::UnboundedSender<Fire>) -> Self {
        Self {
            slots: HashMap::new(),
            next_generation: 0,
            fires,
        }
    }

    /// Cancel any pending timer for `chat_id`, then arm a new one.
    ///
    /// Returns the generation of the new timer. Must be called inside a tokio
    /// runtime.
    pub fn arm(&mut self, chat_id: ChatId, delay: Duration) -> u64 {
        self.cancel(chat_id);

        self.next_generation += 1;
        let generation = self.next_generation;
        let cancel = CancellationToken::new();

        let token = cancel.clone();
        let fires = self.fires.clone();
        tokio::spawn(async move {
            tokio::select! {
              biased;
              _ = token.cancelled() => {}
              _ = sleep(delay) => {
                // Receiver gone means the manager shut down.
                let _ = fires.send(Fire { chat_id, generation });
              }
            }
        });

        self.slots.insert(chat_id, TimerSlot { generation, cancel });
        tracing::debug!(chat_id = chat_id.0, generation, ?delay, "timer armed");
        generation
    }

    /// Cancel the pending timer, if any. Returns whether one was pending.
    pub fn cancel(&mut self, chat_id: ChatId) -> bool {
        match self.slots.remove(&chat_id) {
            Some(slot) => {
                slot.cancel.cancel();
                tracing::debug!(
                    chat_id = chat_id.0,
                    generation = slot.generation,
                    "timer cancelled"
                );
                true
            }
            None => false,
        }
    }

    /// Consume the slot a fire belongs to.
    ///
    /// Returns `false` for stale fires, leaving the current slot untouched.
    pub fn claim(&mut self, fire: &Fire) -> bool {
        match self.slots.get(&fire.chat_id) {
            Some(slot) if slot.generation == fire.generation => {
                self.slots.remove(&fire.chat_id);
                true
            }
            _ => false,
        }
    }

    pub fn cancel_all(&mut self) -> usize {
        let n = self.slots.len();
        for (_, slot) in self.slots.drain() {
            slot.cancel.cancel();
        }
        n
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self, chat_id: ChatId) -> bool {
        self.slots.contains_key(&chat_id)
    }

    #[cfg(test)]
    pub(crate) fn generation(&self, chat_id: ChatId) -> Option<u64> {
        self.slots.get(&chat_id).map(|s| s.generation)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
