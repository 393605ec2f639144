use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use color_eyre::eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Where log lines go. The terminal is off limits while the TUI owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub target: LogTarget,
    pub level: String,
    pub json: bool,
}

impl LogSettings {
    /// Picks the log target for the current mode, or `None` when nothing
    /// should be logged at all.
    pub fn resolve(config: &LoggingConfig, headless: bool) -> Option<Self> {
        let target = match (&config.file, headless) {
            (Some(path), _) => LogTarget::File(path.clone()),
            (None, true) => LogTarget::Stderr,
            (None, false) => return None,
        };
        Some(LogSettings {
            target,
            level: config.level.clone(),
            json: config.json,
        })
    }
}

/// `RUST_LOG` wins over the configured level.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

pub fn init_tracing(settings: &LogSettings) -> Result<()> {
    let filter = env_filter(&settings.level);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match &settings.target {
        LogTarget::File(path) => {
            let writer = Mutex::new(open_log_file(path)?);
            let builder = builder.with_ansi(false).with_writer(writer);
            if settings.json {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
        LogTarget::Stderr => {
            let builder = builder.with_writer(std::io::stderr);
            if settings.json {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
    };
    result.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tui_without_file_logs_nothing() {
        let config = LoggingConfig::default();
        assert_eq!(LogSettings::resolve(&config, false), None);
    }

    #[test]
    fn headless_falls_back_to_stderr() {
        let config = LoggingConfig::default();
        let settings = LogSettings::resolve(&config, true).unwrap();
        assert_eq!(settings.target, LogTarget::Stderr);
        assert_eq!(settings.level, "info");
    }

    #[test]
    fn configured_file_wins() {
        let config = LoggingConfig {
            file: Some(PathBuf::from("/tmp/h.log")),
            level: "debug".to_string(),
            json: true,
        };
        let settings = LogSettings::resolve(&config, true).unwrap();
        assert_eq!(settings.target, LogTarget::File(PathBuf::from("/tmp/h.log")));
        assert!(settings.json);
    }

    #[test]
    fn log_file_parent_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("healthy.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
