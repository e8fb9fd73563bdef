//! `[logging]` section: output format and verbosity of the service and CLI

use serde::{Deserialize, Serialize};
use std::fmt;

/// Crates whose debug output drowns the scan logs; held at `warn` unless
/// the configured level is `trace`
const NOISY_TARGETS: [&str; 4] = ["hyper", "reqwest", "html5ever", "selectors"];

/// How log lines are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines for terminals
    #[default]
    Text,
    /// One JSON object per line for log shippers
    Json,
}

/// Log severity, ordered from quietest to most verbose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const BY_VERBOSITY: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// This level made `steps` notches more verbose, saturating at `trace`
    pub fn raised(self, steps: u8) -> Self {
        let index = (self as usize).saturating_add(steps as usize);
        Self::BY_VERBOSITY[index.min(Self::BY_VERBOSITY.len() - 1)]
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl LoggingConfig {
    /// Configured level raised by one notch per `-v` flag
    pub fn effective_level(&self, verbose: u8) -> LogLevel {
        self.level.raised(verbose)
    }

    /// `EnvFilter` directives for the effective level.
    ///
    /// HTTP and HTML parsing internals stay at `warn` below `trace`.
    pub fn filter_directives(&self, verbose: u8) -> String {
        let level = self.effective_level(verbose);
        if level == LogLevel::Trace {
            return level.to_string();
        }

        let mut directives = vec![level.to_string()];
        let quiet = level.min(LogLevel::Warn);
        directives.extend(NOISY_TARGETS.iter().map(|target| format!("{}={}", target, quiet)));
        directives.join(",")
    }
}
