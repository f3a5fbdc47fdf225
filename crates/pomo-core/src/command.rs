//! The `pomo` chat command: parsing, validation replies and execution.
//!
//! Platform adapters hand over the raw message text and post whatever reply
//! comes back; phase notifications are sent by the manager itself.

use crate::{
    domain::ChatId,
    errors::Error,
    pomodoro::{PomodoroManager, StatusSnapshot},
    Result,
};

pub const NO_ACTIVE_SESSION: &str = "No active study session";

/// Split `"/pomo@bot start 25 4"` into `("pomo", "start 25 4")`.
///
/// Returns `None` when `text` does not start with `prefix`.
pub fn parse_command(text: &str, prefix: &str) -> Option<(String, String)> {
    let rest = text.trim().strip_prefix(prefix)?;
    let mut parts = rest.trim_start().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let args = parts.next().unwrap_or("").trim().to_string();

    // Telegram may send `/cmd@botname arg1 ...`
    let name = first.split('@').next().unwrap_or("").to_lowercase();
    if name.is_empty() {
        return None;
    }
    Some((name, args))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PomoCommand {
    Start { focus_minutes: u32, cycles: u32 },
    Stop,
    Status,
}

impl PomoCommand {
    /// Parse the arguments following the command name.
    ///
    /// Errors are `Error::Validation` carrying the reply for the user.
    pub fn parse(args: &str, prefix: &str) -> Result<Self> {
        let args: Vec<&str> = args.split_whitespace().collect();
        let Some(sub) = args.first() else {
            return Err(Error::Validation(
                "Please specify a subcommand: start, stop, or status".to_string(),
            ));
        };

        match sub.to_lowercase().as_str() {
            "start" => {
                if args.len() < 3 {
                    return Err(Error::Validation(format!(
                        "Usage: {prefix}pomo start <duration> <repeat>\nExample: {prefix}pomo start 25 4"
                    )));
                }
                let focus_minutes = parse_positive(args[1]).ok_or_else(|| {
                    Error::Validation("Please provide a valid duration in minutes".to_string())
                })?;
                let cycles = parse_positive(args[2]).ok_or_else(|| {
                    Error::Validation("Please provide a valid number of repeat cycles".to_string())
                })?;
                Ok(Self::Start {
                    focus_minutes,
                    cycles,
                })
            }
            "stop" => Ok(Self::Stop),
            "status" => Ok(Self::Status),
            _ => Err(Error::Validation(
                "Invalid subcommand. Use: start, stop, or status".to_string(),
            )),
        }
    }
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|v| *v > 0)
}

/// Run a parsed command and return the reply to post, if any.
pub async fn execute(
    manager: &PomodoroManager,
    chat_id: ChatId,
    command: PomoCommand,
) -> Option<String> {
    match command {
        PomoCommand::Start {
            focus_minutes,
            cycles,
        } => match manager.start(chat_id, focus_minutes, cycles).await {
            Ok(_) => None,
            Err(e @ (Error::Validation(_) | Error::Conflict { .. })) => Some(format!("Error: {e}")),
            Err(e) => {
                tracing::error!(chat_id = chat_id.0, error = %e, "failed to start study session");
                Some(format!("Error: {e}"))
            }
        },
        PomoCommand::Stop => {
            if manager.stop(chat_id).await {
                None
            } else {
                Some(NO_ACTIVE_SESSION.to_string())
            }
        }
        PomoCommand::Status => Some(match manager.status(chat_id).await {
            Some(snapshot) => render_status(&snapshot),
            None => NO_ACTIVE_SESSION.to_string(),
        }),
    }
}

pub fn render_status(s: &StatusSnapshot) -> String {
    format!(
        "Current Study Session:\n\
Duration: {} minutes\n\
Remaining Cycles: {}\n\
Current Phase: {}\n\
Time Remaining: {}",
        s.focus_minutes, s.remaining_cycles, s.phase, s.remaining_text
    )
}

pub fn help_text(prefix: &str, break_minutes: u32) -> String {
    format!(
        "🍅 Pomodoro study bot\n\n\
{prefix}pomo start <duration> <repeat> - focus for <duration> minutes, {break_minutes} minute breaks, <repeat> cycles\n\
{prefix}pomo status - time left in the current phase\n\
{prefix}pomo stop - stop this chat's session\n\
{prefix}help - show this message"
    )
}
