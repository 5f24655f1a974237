use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::object::{LogFilter, LogFormat, LogTimeZone};

/// Logging configuration; every field is optional when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    pub format: LogFormat,
    pub filter: LogFilter,
    pub tz: LogTimeZone,
    /// Print event targets (module paths).
    pub with_targets: bool,
    /// Colorize text output; only honoured when stderr is a terminal.
    pub use_color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: LogFilter::default(),
            tz: LogTimeZone::default(),
            with_targets: false,
            use_color: true,
        }
    }
}

impl LogConfig {
    pub(crate) fn ansi(&self) -> bool {
        self.use_color && std::io::stderr().is_terminal()
    }
}
