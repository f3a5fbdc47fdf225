use std::time::Duration;

use tokio::time::Instant;

use crate::pomodoro::session::{Phase, Session};

/// Point-in-time view of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub focus_minutes: u32,
    pub remaining_cycles: u32,
    pub phase: Phase,
    pub remaining: Duration,
    pub remaining_text: String,
}

/// Derive the remaining time of the current phase as of `now`.
///
/// Read-only: nothing is advanced by polling.
pub fn snapshot(session: &Session, now: Instant) -> StatusSnapshot {
    let elapsed = now.saturating_duration_since(session.phase_started_at);
    let remaining = session.phase_duration().saturating_sub(elapsed);

    StatusSnapshot {
        focus_minutes: session.focus_minutes,
        remaining_cycles: session.remaining_cycles,
        phase: session.phase,
        remaining,
        remaining_text: format_remaining(remaining),
    }
}

/// `"{m}m {s}s"` using floor division, so `59.9s` renders as `0m 59s`.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}
