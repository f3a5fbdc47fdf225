use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use pomo_core::{
    config::Config,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    pomodoro::PomodoroManager,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
    pub manager: PomodoroManager,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "pomo bot started"),
        Err(e) => tracing::warn!(error = %e, "could not fetch bot identity"),
    }
    tracing::info!(
        prefix = %cfg.command_prefix,
        break_minutes = cfg.study_break_minutes,
        "configuration loaded"
    );

    // Wrap the raw Telegram messenger with a throttling decorator so bursts of
    // phase notifications stay under flood limits. The adapter still retries
    // once on 429 RetryAfter.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig {
            per_chat_min_interval: cfg.per_chat_min_interval,
            ..ThrottleConfig::default()
        },
    ));

    let manager = PomodoroManager::new(cfg.study_break_minutes, messenger.clone());

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        messenger,
        manager: manager.clone(),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build();

    let token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl-C, shutting down");
            if let Ok(done) = token.shutdown() {
                done.await;
            }
        }
    });

    dispatcher.dispatch().await;

    manager.shutdown().await;
    Ok(())
}
