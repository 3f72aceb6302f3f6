use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Logging settings from `ENVIRONMENT`, `LOG_LEVEL` and `LOG_DIR`.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub environment: String,
    pub level: LogLevel,
    pub dir: String,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Unknown levels fall back to the environment default
    /// (info in production, debug elsewhere).
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let environment = get("ENVIRONMENT")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "development".to_string());

        let default_level = if environment == "production" {
            LogLevel::Info
        } else {
            LogLevel::Debug
        };
        let level = get("LOG_LEVEL")
            .and_then(|v| v.parse().ok())
            .unwrap_or(default_level);

        let dir = get("LOG_DIR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "logs".to_string());

        LogConfig {
            environment,
            level,
            dir,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Default filter directive when `RUST_LOG` is not set.
    pub fn filter_directive(&self) -> String {
        format!(
            "taxdesk_backend={},tower_http=debug,axum=debug",
            self.level
        )
    }
}
