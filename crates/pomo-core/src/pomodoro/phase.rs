//! Pure phase transition logic.
//!
//! The engine does not drive itself; the scheduler fires once per expired
//! phase and the manager applies whatever [`next_transition`] returns.

use crate::pomodoro::session::Phase;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Focus expired: start the break. The cycle counter is untouched.
    StartBreak,
    /// Break expired with cycles left: start the next focus phase.
    StartFocus { remaining_cycles: u32 },
    /// Break expired on the last cycle: the session is over.
    Complete,
}

/// Compute the transition taken when `phase` expires.
///
/// A break always follows the final focus phase; focus never starts once the
/// counter reaches zero.
pub fn next_transition(phase: Phase, remaining_cycles: u32) -> Transition {
    match phase {
        Phase::Focus => Transition::StartBreak,
        Phase::Break => match remaining_cycles.saturating_sub(1) {
            0 => Transition::Complete,
            left => Transition::StartFocus {
                remaining_cycles: left,
            },
        },
    }
}
