//! Per-chat pomodoro sessions.
//!
//! Each chat runs an independent focus/break cycle. State lives in one
//! [`store::SessionStore`] record per chat, timers in one
//! [`scheduler::Scheduler`] slot per chat, and both are owned by the
//! [`manager::PomodoroManager`] behind a single lock so they change together.

pub mod manager;
pub mod notices;
mod outbox;
pub mod phase;
pub mod scheduler;
pub mod session;
pub mod status;
pub mod store;

pub use manager::PomodoroManager;
pub use session::{Phase, Session, SessionConfig};
pub use status::StatusSnapshot;
