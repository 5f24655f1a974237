use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::logger::{LogError, LogResult};

/// Environment variable that overrides the configured filter.
pub const FILTER_ENV: &str = "SHARDGATE_LOG";

/// Validated `EnvFilter` directive string, e.g. `"info"` or `"shardgate_core=debug,warn"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogFilter(String);

impl LogFilter {
    pub fn new(directives: impl Into<String>) -> LogResult<Self> {
        let directives = directives.into();
        EnvFilter::try_new(&directives)
            .map_err(|e| LogError::InvalidFilter(format!("{directives}: {e}")))?;
        Ok(Self(directives))
    }

    /// [`FILTER_ENV`] when set and valid, `self` otherwise.
    pub fn or_env(self) -> LogResult<Self> {
        match std::env::var(FILTER_ENV) {
            Ok(v) if !v.trim().is_empty() => Self::new(v),
            _ => Ok(self),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_env_filter(&self) -> LogResult<EnvFilter> {
        EnvFilter::try_new(&self.0).map_err(|e| LogError::InvalidFilter(format!("{}: {e}", self.0)))
    }
}

impl Default for LogFilter {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl FromStr for LogFilter {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LogFilter {
    type Error = LogError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LogFilter> for String {
    fn from(f: LogFilter) -> Self {
        f.0
    }
}

impl fmt::Display for LogFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
