//! Process configuration from the environment and `.env` files.
//!
//! Lookup order (first hit wins): process environment, `./.env`,
//! then `.env` in the platform config directory:
//!   macOS:   ~/Library/Application Support/screen-printer/.env
//!   Linux:   ~/.config/screen-printer/.env
//!   Windows: %APPDATA%/screen-printer/.env

use crate::printer::{ClickFailurePolicy, PrintSettings};
use std::path::PathBuf;
use std::time::Duration;

pub const OUTPUT: &str = "SCREEN_PRINTER_OUTPUT";
pub const SCALE_FACTOR: &str = "SCREEN_PRINTER_SCALE_FACTOR";
pub const ON_CLICK_FAILURE: &str = "SCREEN_PRINTER_ON_CLICK_FAILURE";
pub const CAPTURE_TIMEOUT_SECS: &str = "SCREEN_PRINTER_CAPTURE_TIMEOUT_SECS";
pub const OPEN_VIEWER: &str = "SCREEN_PRINTER_OPEN_VIEWER";
pub const REPORT_REJECTED_STARTS: &str = "SCREEN_PRINTER_REPORT_REJECTED_STARTS";

const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub output_path: PathBuf,
    pub scale_factor: Option<f64>,
    pub on_click_failure: ClickFailurePolicy,
    pub capture_timeout: Option<Duration>,
    pub open_viewer: bool,
    pub report_rejected_starts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: std::env::temp_dir().join("preview.pdf"),
            scale_factor: None,
            on_click_failure: ClickFailurePolicy::Continue,
            capture_timeout: Some(Duration::from_secs(DEFAULT_CAPTURE_TIMEOUT_SECS)),
            open_viewer: true,
            report_rejected_starts: false,
        }
    }
}

/// Directory holding the optional per-user `.env`.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("screen-printer")
}

impl Config {
    /// Loads `.env` files (without overriding variables already set) and
    /// reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("[CONFIG] Loaded {}", path.display());
        }
        let user_env = config_dir().join(".env");
        if user_env.is_file() {
            dotenvy::from_path(&user_env).map_err(|e| ConfigError::DotEnv {
                path: user_env.clone(),
                reason: e.to_string(),
            })?;
            log::debug!("[CONFIG] Loaded {}", user_env.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset and empty keys keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(path) = get(OUTPUT) {
            config.output_path = PathBuf::from(path);
        }

        if let Some(raw) = get(SCALE_FACTOR) {
            let factor: f64 = parse(SCALE_FACTOR, &raw)?;
            if !factor.is_finite() || factor <= 0.0 {
                return Err(ConfigError::Invalid {
                    key: SCALE_FACTOR,
                    value: raw,
                    reason: "must be a positive number".to_string(),
                });
            }
            config.scale_factor = Some(factor);
        }

        if let Some(raw) = get(ON_CLICK_FAILURE) {
            config.on_click_failure = raw.parse().map_err(|reason| ConfigError::Invalid {
                key: ON_CLICK_FAILURE,
                value: raw.clone(),
                reason,
            })?;
        }

        if let Some(raw) = get(CAPTURE_TIMEOUT_SECS) {
            let secs: u64 = parse(CAPTURE_TIMEOUT_SECS, &raw)?;
            config.capture_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(raw) = get(OPEN_VIEWER) {
            config.open_viewer = parse_bool(OPEN_VIEWER, &raw)?;
        }

        if let Some(raw) = get(REPORT_REJECTED_STARTS) {
            config.report_rejected_starts = parse_bool(REPORT_REJECTED_STARTS, &raw)?;
        }

        Ok(config)
    }

    pub fn print_settings(&self) -> PrintSettings {
        PrintSettings {
            output_path: self.output_path.clone(),
            scale_factor: self.scale_factor,
            on_click_failure: self.on_click_failure,
            capture_timeout: self.capture_timeout,
        }
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to read {path}: {reason}")]
    DotEnv { path: PathBuf, reason: String },
}
