use std::sync::Arc;

use teloxide::prelude::*;

use pomo_core::{
    command::{execute, help_text, PomoCommand},
    domain::ChatId,
    errors::Error,
    formatting::escape_html,
};

use crate::router::AppState;

pub async fn handle_command(
    tg_chat: teloxide::types::ChatId,
    name: &str,
    args: &str,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let chat_id = ChatId(tg_chat.0);
    let prefix = &state.cfg.command_prefix;

    let reply = match name {
        "start" | "help" => Some(help_text(prefix, state.manager.break_minutes())),

        "pomo" => match PomoCommand::parse(args, prefix) {
            Ok(cmd) => {
                tracing::debug!(chat_id = chat_id.0, ?cmd, "pomo command");
                execute(&state.manager, chat_id, cmd).await
            }
            Err(Error::Validation(msg)) => Some(msg),
            Err(e) => {
                tracing::error!(chat_id = chat_id.0, error = %e, "error in pomodoro command");
                Some(format!("Error: {e}"))
            }
        },

        // Not ours; stay quiet like any other unknown command.
        _ => None,
    };

    if let Some(reply) = reply {
        if let Err(e) = state
            .messenger
            .send_html(chat_id, &escape_html(&reply))
            .await
        {
            tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send reply");
        }
    }

    Ok(())
}
