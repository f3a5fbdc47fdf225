use std::sync::Arc;

use pomo_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), pomo_core::Error> {
    let cfg = Arc::new(Config::load()?);
    pomo_core::logging::init("pomo", cfg.log_dir.as_deref())?;

    pomo_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| pomo_core::Error::External(format!("telegram bot failed: {e}")))?;

    tracing::info!("bye");
    Ok(())
}
