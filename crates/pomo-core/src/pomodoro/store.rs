use std::collections::HashMap;

use tokio::time::Instant;

use crate::{
    domain::ChatId,
    errors::Error,
    pomodoro::session::{Phase, Session, SessionConfig},
    Result,
};

/// Owns the single authoritative session record per chat.
///
/// Every field change goes through here so a reader never observes a phase
/// that disagrees with its cycle count or start timestamp.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<ChatId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh session; fails with `Conflict` if the chat already has one.
    pub fn create(
        &mut self,
        chat_id: ChatId,
        config: SessionConfig,
        now: Instant,
    ) -> Result<&Session> {
        if self.sessions.contains_key(&chat_id) {
            return Err(Error::Conflict { chat_id });
        }
        Ok(self
            .sessions
            .entry(chat_id)
            .or_insert_with(|| Session::new(chat_id, config, now)))
    }

    pub fn get(&self, chat_id: ChatId) -> Option<&Session> {
        self.sessions.get(&chat_id)
    }

    /// Move a session into `phase`, resetting its phase clock.
    pub fn begin_phase(
        &mut self,
        chat_id: ChatId,
        phase: Phase,
        remaining_cycles: u32,
        now: Instant,
    ) -> Option<&Session> {
        let session = self.sessions.get_mut(&chat_id)?;
        session.phase = phase;
        session.remaining_cycles = remaining_cycles.min(session.total_cycles);
        session.phase_started_at = now;
        Some(session)
    }

    /// Idempotent: removing an absent chat returns `None`.
    pub fn remove(&mut self, chat_id: ChatId) -> Option<Session> {
        self.sessions.remove(&chat_id)
    }

    pub fn clear(&mut self) -> usize {
        let n = self.sessions.len();
        self.sessions.clear();
        n
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SessionConfig {
        SessionConfig::new(25, 4, 5).unwrap()
    }

    #[test]
    fn create_conflicts_and_keeps_existing_session() {
        let mut store = SessionStore::new();
        let t0 = Instant::now();
        store.create(ChatId(1), cfg(), t0).unwrap();

        let other = SessionConfig::new(50, 2, 5).unwrap();
        let err = store.create(ChatId(1), other, t0).unwrap_err();
        assert!(matches!(err, Error::Conflict { chat_id } if chat_id == ChatId(1)));

        let s = store.get(ChatId(1)).unwrap();
        assert_eq!(s.focus_minutes, 25);
        assert_eq!(s.total_cycles, 4);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn chats_are_independent() {
        let mut store = SessionStore::new();
        let t0 = Instant::now();
        store.create(ChatId(1), cfg(), t0).unwrap();
        store.create(ChatId(2), cfg(), t0).unwrap();
        store.begin_phase(ChatId(1), Phase::Break, 4, t0);

        assert_eq!(store.get(ChatId(1)).unwrap().phase, Phase::Break);
        assert_eq!(store.get(ChatId(2)).unwrap().phase, Phase::Focus);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = SessionStore::new();
        store.create(ChatId(1), cfg(), Instant::now()).unwrap();
        assert!(store.remove(ChatId(1)).is_some());
        assert!(store.remove(ChatId(1)).is_none());
        assert!(store.get(ChatId(1)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn begin_phase_on_absent_chat_is_none() {
        let mut store = SessionStore::new();
        assert!(store
            .begin_phase(ChatId(9), Phase::Focus, 1, Instant::now())
            .is_none());
    }
}
