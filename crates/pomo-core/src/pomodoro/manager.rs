use std::sync::{Arc, Weak};

use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::ChatId,
    messaging::port::MessagingPort,
    pomodoro::{
        notices,
        outbox::Outbox,
        phase::{next_transition, Transition},
        scheduler::{Fire, Scheduler},
        session::{Phase, Session, SessionConfig},
        status::{self, StatusSnapshot},
        store::SessionStore,
    },
    Error, Result,
};

/// Runs every chat's pomodoro session.
///
/// Create one at startup and hand clones to whatever drives `start`, `stop`
/// and `status`. Call [`PomodoroManager::shutdown`] on teardown; dropping the
/// last clone also cancels every pending timer.
#[derive(Clone)]
pub struct PomodoroManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    break_minutes: u32,
    outbox: Arc<Outbox>,
    state: Mutex<ManagerState>,
    shutdown: CancellationToken,
}

// A chat has a session iff it has an armed timer; both change under one lock.
// Notices are queued under the same lock so they leave in transition order.
struct ManagerState {
    store: SessionStore,
    scheduler: Scheduler,
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        let timers = self.state.get_mut().scheduler.cancel_all();
        self.shutdown.cancel();
        tracing::debug!(timers, "pomodoro manager dropped");
    }
}

impl PomodoroManager {
    /// Build the manager and spawn its driving loop. Must be called inside a
    /// tokio runtime.
    pub fn new(break_minutes: u32, notifier: Arc<dyn MessagingPort>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(ManagerInner {
            break_minutes,
            outbox: Outbox::new(notifier),
            state: Mutex::new(ManagerState {
                store: SessionStore::new(),
                scheduler: Scheduler::new(tx),
            }),
            shutdown: CancellationToken::new(),
        });

        // The loop only holds a weak handle so dropping every manager clone
        // frees the state and stops the loop.
        let weak = Arc::downgrade(&inner);
        let shutdown = inner.shutdown.clone();
        tokio::spawn(drive(weak, shutdown, rx));

        Self { inner }
    }

    pub fn break_minutes(&self) -> u32 {
        self.inner.break_minutes
    }

    /// Start a session for `chat_id` with the first focus phase.
    pub async fn start(&self, chat_id: ChatId, focus_minutes: u32, cycles: u32) -> Result<Session> {
        if self.inner.shutdown.is_cancelled() {
            return Err(Error::External("pomodoro manager is shut down".to_string()));
        }
        let config = SessionConfig::new(focus_minutes, cycles, self.inner.break_minutes)?;

        let mut st = self.inner.state.lock().await;
        let session = st.store.create(chat_id, config, Instant::now())?.clone();
        st.scheduler.arm(chat_id, session.focus_duration);
        self.inner
            .outbox
            .push(chat_id, notices::focus_started(focus_minutes));
        drop(st);

        tracing::info!(
            chat_id = chat_id.0,
            focus_minutes,
            cycles,
            break_minutes = self.inner.break_minutes,
            "study session started"
        );
        Ok(session)
    }

    /// Stop the chat's session. Returns whether one was running.
    ///
    /// The "stopped" notice is only sent when there was something to stop.
    pub async fn stop(&self, chat_id: ChatId) -> bool {
        let mut st = self.inner.state.lock().await;
        st.scheduler.cancel(chat_id);
        let existed = st.store.remove(chat_id).is_some();
        if existed {
            self.inner.outbox.push(chat_id, notices::stopped());
        }
        drop(st);

        if existed {
            tracing::info!(chat_id = chat_id.0, "study session stopped");
        } else {
            tracing::debug!(chat_id = chat_id.0, "stop requested without a session");
        }
        existed
    }

    pub async fn status(&self, chat_id: ChatId) -> Option<StatusSnapshot> {
        let st = self.inner.state.lock().await;
        st.store
            .get(chat_id)
            .map(|s| status::snapshot(s, Instant::now()))
    }

    /// Cancel every pending timer, drop all sessions and stop the driving loop.
    pub async fn shutdown(&self) {
        let (timers, sessions) = {
            let mut st = self.inner.state.lock().await;
            (st.scheduler.cancel_all(), st.store.clear())
        };
        self.inner.shutdown.cancel();
        tracing::info!(timers, sessions, "pomodoro manager shut down");
    }

    /// Apply one expired phase. Stale fires are ignored.
    pub(crate) async fn handle_fire(&self, fire: Fire) {
        let chat_id = fire.chat_id;

        let mut st = self.inner.state.lock().await;
        if !st.scheduler.claim(&fire) {
            tracing::debug!(
                chat_id = chat_id.0,
                generation = fire.generation,
                "ignoring stale timer fire"
            );
            return;
        }

        let Some(session) = st.store.get(chat_id) else {
            tracing::warn!(chat_id = chat_id.0, "timer fired for a chat without a session");
            return;
        };
        let focus_minutes = session.focus_minutes;
        let (focus_duration, break_duration) = (session.focus_duration, session.break_duration);
        let transition = next_transition(session.phase, session.remaining_cycles);
        let remaining_cycles = session.remaining_cycles;
        let now = Instant::now();

        let notice = match transition {
            Transition::StartBreak => {
                st.store
                    .begin_phase(chat_id, Phase::Break, remaining_cycles, now);
                st.scheduler.arm(chat_id, break_duration);
                tracing::info!(chat_id = chat_id.0, remaining_cycles, "break started");
                notices::break_started(self.inner.break_minutes)
            }
            Transition::StartFocus { remaining_cycles } => {
                st.store
                    .begin_phase(chat_id, Phase::Focus, remaining_cycles, now);
                st.scheduler.arm(chat_id, focus_duration);
                tracing::info!(chat_id = chat_id.0, remaining_cycles, "focus started");
                notices::next_focus_started(focus_minutes)
            }
            Transition::Complete => {
                st.store.remove(chat_id);
                st.scheduler.cancel(chat_id);
                tracing::info!(chat_id = chat_id.0, "study session completed");
                notices::completed()
            }
        };

        // Delivery happens on the outbox's task, so a slow chat cannot hold up
        // other chats' transitions.
        self.inner.outbox.push(chat_id, notice);
    }
}

async fn drive(
    manager: Weak<ManagerInner>,
    shutdown: CancellationToken,
    mut fires: mpsc::UnboundedReceiver<Fire>,
) {
    loop {
        tokio::select! {
          _ = shutdown.cancelled() => break,
          fire = fires.recv() => {
            let Some(fire) = fire else {
              break;
            };
            let Some(inner) = manager.upgrade() else {
              break;
            };
            PomodoroManager { inner }.handle_fire(fire).await;
          }
        }
    }
    tracing::debug!("pomodoro driver stopped");
}
