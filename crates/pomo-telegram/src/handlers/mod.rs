//! Telegram update handlers.
//!
//! Messages from bots and messages without the command prefix are ignored;
//! everything else is routed by command name.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use pomo_core::command::parse_command;

use crate::router::AppState;

mod commands;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.from().map(|u| u.is_bot).unwrap_or(true) {
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some((name, args)) = parse_command(text, &state.cfg.command_prefix) else {
        return Ok(());
    };

    commands::handle_command(msg.chat.id, &name, &args, state).await
}
