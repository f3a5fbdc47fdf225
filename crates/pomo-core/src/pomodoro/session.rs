use std::{fmt, time::Duration};

use tokio::time::Instant;

use crate::{domain::ChatId, errors::Error, Result};

/// The two alternating phases of a session.
///
/// Completion is not a phase: a completed session is removed from the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Focus,
    Break,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Focus => write!(f, "Study"),
            Self::Break => write!(f, "Break"),
        }
    }
}

/// Validated parameters for a new session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub focus_minutes: u32,
    pub cycles: u32,
    pub break_minutes: u32,
}

impl SessionConfig {
    pub fn new(focus_minutes: u32, cycles: u32, break_minutes: u32) -> Result<Self> {
        if focus_minutes == 0 {
            return Err(Error::Validation(
                "Please provide a valid duration in minutes".to_string(),
            ));
        }
        if cycles == 0 {
            return Err(Error::Validation(
                "Please provide a valid number of repeat cycles".to_string(),
            ));
        }
        if break_minutes == 0 {
            return Err(Error::Validation(
                "Break duration must be at least 1 minute".to_string(),
            ));
        }
        Ok(Self {
            focus_minutes,
            cycles,
            break_minutes,
        })
    }

    pub fn focus_duration(&self) -> Duration {
        minutes(self.focus_minutes)
    }

    pub fn break_duration(&self) -> Duration {
        minutes(self.break_minutes)
    }
}

/// Live state of one chat's pomodoro cycle.
#[derive(Clone, Debug)]
pub struct Session {
    pub chat_id: ChatId,
    pub focus_minutes: u32,
    pub focus_duration: Duration,
    pub break_duration: Duration,
    pub total_cycles: u32,
    /// Decremented once per completed break; never exceeds `total_cycles`.
    pub remaining_cycles: u32,
    pub phase: Phase,
    /// Set whenever a phase begins. Only read to derive the remaining time.
    pub phase_started_at: Instant,
}

impl Session {
    pub fn new(chat_id: ChatId, config: SessionConfig, now: Instant) -> Self {
        Self {
            chat_id,
            focus_minutes: config.focus_minutes,
            focus_duration: config.focus_duration(),
            break_duration: config.break_duration(),
            total_cycles: config.cycles,
            remaining_cycles: config.cycles,
            phase: Phase::Focus,
            phase_started_at: now,
        }
    }

    /// Full length of the current phase.
    pub fn phase_duration(&self) -> Duration {
        match self.phase {
            Phase::Focus => self.focus_duration,
            Phase::Break => self.break_duration,
        }
    }
}

pub(crate) fn minutes(m: u32) -> Duration {
    Duration::from_secs(u64::from(m) * 60)
}
