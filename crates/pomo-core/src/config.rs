use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{errors::Error, Result};

const DEFAULT_CONFIG_FILE: &str = "config.json";
const DEFAULT_PREFIX: &str = "/";
const DEFAULT_STUDY_BREAK_MINUTES: u32 = 5;
const DEFAULT_LOG_DIR: &str = "logs";

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,

    /// Prefix a message must start with to be treated as a command.
    pub command_prefix: String,
    /// Process-wide break length between focus phases.
    pub study_break_minutes: u32,

    /// Directory for the daily log file; `None` logs to the console only.
    pub log_dir: Option<PathBuf>,

    pub per_chat_min_interval: Duration,
}

/// On-disk `config.json` shape.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub prefix: Option<String>,
    pub study_break_duration: Option<u32>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    fn read(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let path = env_str("POMO_CONFIG")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        let file = FileConfig::read(Path::new(&path))?.unwrap_or_default();

        Self::resolve(file, env_str)
    }

    /// Merge the file config with variables from `lookup` (env wins).
    pub fn resolve(file: FileConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let command_prefix = lookup("COMMAND_PREFIX")
            .or(file.prefix)
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string())
            .trim()
            .to_string();
        if command_prefix.is_empty() {
            return Err(Error::Config("command prefix must not be empty".to_string()));
        }

        let study_break_minutes = match lookup("STUDY_BREAK_DURATION") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                Error::Config(format!("invalid STUDY_BREAK_DURATION: {raw}"))
            })?,
            None => file
                .study_break_duration
                .unwrap_or(DEFAULT_STUDY_BREAK_MINUTES),
        };
        if study_break_minutes == 0 {
            return Err(Error::Config(
                "study break duration must be at least 1 minute".to_string(),
            ));
        }

        let log_to_file = lookup("LOG_TO_FILE").map(|s| parse_bool(&s)).unwrap_or(true);
        let log_dir = log_to_file.then(|| {
            PathBuf::from(
                lookup("LOG_DIR")
                    .and_then(non_empty)
                    .unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
            )
        });

        let per_chat_min_interval = Duration::from_millis(
            lookup("PER_CHAT_MIN_INTERVAL_MS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(1050),
        );

        Ok(Self {
            telegram_bot_token,
            command_prefix,
            study_break_minutes,
            log_dir,
            per_chat_min_interval,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn parses_original_config_json_shape() {
        let file = FileConfig::parse(r#"{ "prefix": "!", "studyBreakDuration": 10 }"#).unwrap();
        assert_eq!(file.prefix.as_deref(), Some("!"));
        assert_eq!(file.study_break_duration, Some(10));
    }

    #[test]
    fn defaults_apply_without_file_or_overrides() {
        let cfg = Config::resolve(FileConfig::default(), lookup(&[("TELEGRAM_BOT_TOKEN", "t")]))
            .unwrap();
        assert_eq!(cfg.command_prefix, "/");
        assert_eq!(cfg.study_break_minutes, 5);
        assert_eq!(cfg.log_dir, Some(PathBuf::from("logs")));
        assert_eq!(cfg.per_chat_min_interval, Duration::from_millis(1050));
    }

    #[test]
    fn env_overrides_file_values() {
        let file = FileConfig {
            prefix: Some("!".to_string()),
            study_break_duration: Some(10),
        };
        let cfg = Config::resolve(
            file,
            lookup(&[
                ("TELEGRAM_BOT_TOKEN", "t"),
                ("STUDY_BREAK_DURATION", "3"),
                ("LOG_TO_FILE", "off"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.command_prefix, "!");
        assert_eq!(cfg.study_break_minutes, 3);
        assert!(cfg.log_dir.is_none());
    }

    #[test]
    fn rejects_missing_token_and_zero_break() {
        let err = Config::resolve(FileConfig::default(), lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::resolve(
            FileConfig::default(),
            lookup(&[("TELEGRAM_BOT_TOKEN", "t"), ("STUDY_BREAK_DURATION", "0")]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
