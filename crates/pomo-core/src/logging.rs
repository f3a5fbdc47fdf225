use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::Local;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{Error, Result};

/// Initialize logging/tracing for the bot.
///
/// Logs go to the console and, when `log_dir` is set, are appended to
/// `<log_dir>/<YYYY-MM-DD>.log`. A log file that cannot be opened is reported
/// and skipped; console logging still works.
pub fn init(service_name: &str, log_dir: Option<&Path>) -> Result<()> {
    // Default: info for our crates, warn for everything else.
    // Can be overridden with `RUST_LOG`.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,pomo=info,pomo_core=info,pomo_telegram=info,{service_name}=info"
        ))
    });

    let mut file_error = None;
    let file_layer = match log_dir.map(open_daily_log) {
        Some(Ok(file)) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        ),
        Some(Err(e)) => {
            file_error = Some(e);
            None
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_ansi(true))
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::External(format!("failed to install logger: {e}")))?;

    if let Some(e) = file_error {
        tracing::warn!(error = %e, "failed to open log file, logging to console only");
    }

    Ok(())
}

/// Path of today's log file inside `dir`.
pub fn daily_log_path(dir: &Path) -> PathBuf {
    dir.join(format!("{}.log", Local::now().format("%Y-%m-%d")))
}

fn open_daily_log(dir: &Path) -> Result<File> {
    fs::create_dir_all(dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(daily_log_path(dir))?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_log_file_is_named_by_date() {
        let path = daily_log_path(Path::new("/var/log/pomo"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with(".log"));
        // YYYY-MM-DD.log
        assert_eq!(name.len(), 14);
        assert_eq!(&name[4..5], "-");
        assert_eq!(&name[7..8], "-");
    }

    #[test]
    fn opens_log_file_creating_the_directory() {
        let root = std::env::temp_dir().join(format!("pomo-logs-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);

        open_daily_log(&root).unwrap();
        assert!(daily_log_path(&root).exists());

        let _ = fs::remove_dir_all(&root);
    }
}
