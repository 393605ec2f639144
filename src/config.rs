use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::KeyCode;
use serde::Deserialize;

use crate::sampler::SamplerConfig;
use crate::sampler::dimension::Dimension;
use crate::sampler::group::GroupBy;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub network: NetworkConfig,
    pub colors: ColorsConfig,
    pub keybinds: KeybindsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub sample_seconds: f64,
    pub window_seconds: f64,
    pub group_by: String,
    pub top_k: usize,
    pub only_cpu: bool,
    pub default_tab: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            sample_seconds: 1.0,
            window_seconds: 60.0,
            group_by: "pid".to_string(),
            top_k: 20,
            only_cpu: false,
            default_tab: "cpu".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub enabled: bool,
    pub ss_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            enabled: true,
            ss_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    pub theme: String,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        ColorsConfig {
            theme: "dark".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KeybindsConfig {
    pub quit: String,
    pub kill: String,
    pub force_kill: String,
    pub help: String,
    pub next_tab: String,
    pub prev_tab: String,
}

impl Default for KeybindsConfig {
    fn default() -> Self {
        KeybindsConfig {
            quit: "q".to_string(),
            kill: "k".to_string(),
            force_kill: "K".to_string(),
            help: "?".to_string(),
            next_tab: "Tab".to_string(),
            prev_tab: "BackTab".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            file: None,
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Upper bound on samples per history buffer: one day at one sample a second.
pub const MAX_WINDOW_SAMPLES: usize = 86_400;

/// Startup configuration the sampler cannot run with.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidSamplePeriod(f64),
    EmptyWindow { window_seconds: f64, sample_seconds: f64 },
    WindowTooLarge { samples: f64 },
    UnknownGroupBy(String),
    ZeroTopK,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSamplePeriod(secs) => {
                write!(f, "sample period must be a positive number of seconds, got {secs}")
            }
            ConfigError::EmptyWindow {
                window_seconds,
                sample_seconds,
            } => write!(
                f,
                "a {window_seconds}s window holds no samples at one per {sample_seconds}s"
            ),
            ConfigError::WindowTooLarge { samples } => write!(
                f,
                "window holds {samples:.0} samples, at most {MAX_WINDOW_SAMPLES} are allowed"
            ),
            ConfigError::UnknownGroupBy(mode) => {
                write!(f, "unknown grouping mode '{mode}' (expected pid, ppid or name)")
            }
            ConfigError::ZeroTopK => write!(f, "top_k must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Validates the `[general]` section and resolves it into the sampler's
    /// runtime configuration.
    pub fn sampler_config(
        &self,
        page_size: u64,
        core_count: usize,
    ) -> Result<SamplerConfig, ConfigError> {
        let general = &self.general;
        let sample_seconds = general.sample_seconds;
        if !sample_seconds.is_finite() || sample_seconds <= 0.0 {
            return Err(ConfigError::InvalidSamplePeriod(sample_seconds));
        }
        let sample_period = Duration::try_from_secs_f64(sample_seconds)
            .ok()
            .filter(|period| !period.is_zero())
            .ok_or(ConfigError::InvalidSamplePeriod(sample_seconds))?;
        let samples = general.window_seconds / sample_seconds;
        if samples.is_nan() || samples < 1.0 {
            return Err(ConfigError::EmptyWindow {
                window_seconds: general.window_seconds,
                sample_seconds,
            });
        }
        if samples >= (MAX_WINDOW_SAMPLES + 1) as f64 {
            return Err(ConfigError::WindowTooLarge { samples });
        }
        let group_by = GroupBy::from_str_config(&general.group_by)
            .ok_or_else(|| ConfigError::UnknownGroupBy(general.group_by.clone()))?;
        if general.top_k == 0 {
            return Err(ConfigError::ZeroTopK);
        }

        let dimensions = if general.only_cpu {
            vec![Dimension::Cpu]
        } else {
            Dimension::ALL.to_vec()
        };

        Ok(SamplerConfig {
            group_by,
            sample_period,
            window: samples.trunc() as usize,
            top_k: general.top_k,
            dimensions,
            page_size,
            core_count: core_count.max(1),
        })
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("healthy").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

/// Parses a keybind name from the config file.
pub fn parse_key(s: &str) -> Option<KeyCode> {
    match s {
        "Enter" => Some(KeyCode::Enter),
        "Escape" | "Esc" => Some(KeyCode::Esc),
        "Tab" => Some(KeyCode::Tab),
        "BackTab" | "Shift+Tab" => Some(KeyCode::BackTab),
        "Space" => Some(KeyCode::Char(' ')),
        "Left" => Some(KeyCode::Left),
        "Right" => Some(KeyCode::Right),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(KeyCode::Char(c)),
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.general.sample_seconds, 1.0);
        assert_eq!(config.general.window_seconds, 60.0);
        assert_eq!(config.general.group_by, "pid");
        assert_eq!(config.general.top_k, 20);
        assert!(config.network.enabled);
        assert_eq!(config.network.ss_timeout_ms, 2000);
        assert_eq!(config.colors.theme, "dark");
        assert_eq!(config.keybinds.quit, "q");
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[general]
sample_seconds = 0.5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.sample_seconds, 0.5);
        // Other fields should be defaults
        assert_eq!(config.general.window_seconds, 60.0);
        assert_eq!(config.keybinds.kill, "k");
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[general]
sample_seconds = 2.0
window_seconds = 30.0
group_by = "name"
only_cpu = true
default_tab = "io"

[network]
enabled = false
ss_timeout_ms = 500

[colors]
theme = "light"

[keybinds]
quit = "x"

[logging]
file = "/tmp/healthy.log"
level = "debug"
json = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.group_by, "name");
        assert!(config.general.only_cpu);
        assert_eq!(config.general.default_tab, "io");
        assert!(!config.network.enabled);
        assert_eq!(config.network.ss_timeout_ms, 500);
        assert_eq!(config.colors.theme, "light");
        assert_eq!(config.keybinds.quit, "x");
        assert_eq!(
            config.logging.file.as_deref(),
            Some(Path::new("/tmp/healthy.log"))
        );
        assert!(config.logging.json);
    }

    #[test]
    fn missing_file_returns_default() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(config.general.sample_seconds, 1.0);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml {{{{").unwrap();
        let config = load_config_from_path(&path);
        assert_eq!(config.general.window_seconds, 60.0);
    }

    #[test]
    fn sampler_config_resolves_window() {
        let mut config = Config::default();
        config.general.sample_seconds = 0.75;
        config.general.window_seconds = 10.0;
        config.general.group_by = "ppid".to_string();
        let resolved = config.sampler_config(4096, 8).unwrap();
        // 10 / 0.75 = 13.3, truncated
        assert_eq!(resolved.window, 13);
        assert_eq!(resolved.group_by, GroupBy::ParentPid);
        assert_eq!(resolved.sample_period, Duration::from_millis(750));
        assert_eq!(resolved.dimensions.len(), 4);
        assert_eq!(resolved.core_count, 8);
    }

    #[test]
    fn sampler_config_rejects_bad_values() {
        let mut config = Config::default();
        config.general.sample_seconds = 0.0;
        assert_eq!(
            config.sampler_config(4096, 1),
            Err(ConfigError::InvalidSamplePeriod(0.0))
        );

        config.general.sample_seconds = 5.0;
        config.general.window_seconds = 2.0;
        assert!(matches!(
            config.sampler_config(4096, 1),
            Err(ConfigError::EmptyWindow { .. })
        ));

        config.general.window_seconds = 60.0;
        config.general.group_by = "user".to_string();
        assert_eq!(
            config.sampler_config(4096, 1),
            Err(ConfigError::UnknownGroupBy("user".to_string()))
        );
    }

    #[test]
    fn sampler_config_rejects_extreme_periods() {
        let mut config = Config::default();
        config.general.sample_seconds = 1e20;
        config.general.window_seconds = 1e21;
        assert_eq!(
            config.sampler_config(4096, 1),
            Err(ConfigError::InvalidSamplePeriod(1e20))
        );

        config.general.window_seconds = 60.0;
        for tiny in [1e-6, 1e-9] {
            config.general.sample_seconds = tiny;
            let err = config.sampler_config(4096, 1).unwrap_err();
            assert!(matches!(err, ConfigError::WindowTooLarge { .. }), "{tiny}: {err}");
        }

        // rounds down to a zero Duration
        config.general.sample_seconds = 1e-300;
        for window_seconds in [60.0, 1e-299] {
            config.general.window_seconds = window_seconds;
            assert_eq!(
                config.sampler_config(4096, 1),
                Err(ConfigError::InvalidSamplePeriod(1e-300))
            );
        }

        config.general.sample_seconds = 1.0;
        config.general.window_seconds = f64::INFINITY;
        assert!(matches!(
            config.sampler_config(4096, 1),
            Err(ConfigError::WindowTooLarge { .. })
        ));
    }

    #[test]
    fn sampler_config_accepts_largest_window() {
        let mut config = Config::default();
        config.general.sample_seconds = 1.0;
        config.general.window_seconds = MAX_WINDOW_SAMPLES as f64;
        let resolved = config.sampler_config(4096, 1).unwrap();
        assert_eq!(resolved.window, MAX_WINDOW_SAMPLES);

        config.general.window_seconds = MAX_WINDOW_SAMPLES as f64 + 1.0;
        assert!(config.sampler_config(4096, 1).is_err());
    }

    #[test]
    fn only_cpu_limits_dimensions() {
        let mut config = Config::default();
        config.general.only_cpu = true;
        let resolved = config.sampler_config(4096, 1).unwrap();
        assert_eq!(resolved.dimensions, vec![Dimension::Cpu]);
    }

    #[test]
    fn parses_keybind_names() {
        assert_eq!(parse_key("q"), Some(KeyCode::Char('q')));
        assert_eq!(parse_key("Tab"), Some(KeyCode::Tab));
        assert_eq!(parse_key("BackTab"), Some(KeyCode::BackTab));
        assert_eq!(parse_key("Esc"), Some(KeyCode::Esc));
        assert_eq!(parse_key("ctrl-x"), None);
    }
}
