use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicI32, Ordering},
};

use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::logger::LogError;

/// Local offset in seconds captured by [`init_local_offset`]; UTC until then.
static LOCAL_OFFSET_SECS: AtomicI32 = AtomicI32::new(0);

/// Timezone of log timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTimeZone {
    #[default]
    Utc,
    /// Offset captured once by [`init_local_offset`].
    Local,
}

impl LogTimeZone {
    /// Offset to apply to timestamps right now.
    pub fn offset(&self) -> UtcOffset {
        match self {
            LogTimeZone::Utc => UtcOffset::UTC,
            LogTimeZone::Local => cached_local_offset(),
        }
    }
}

impl FromStr for LogTimeZone {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            _ => Err(LogError::InvalidTimeZone(s.to_string())),
        }
    }
}

impl fmt::Display for LogTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogTimeZone::Utc => "utc",
            LogTimeZone::Local => "local",
        })
    }
}

/// Capture the local UTC offset for [`LogTimeZone::Local`].
///
/// Must run in `main()` before the tokio runtime (or any other thread) starts: most Unix
/// platforms refuse offset detection once the process is multi-threaded. On failure the offset
/// stays UTC and `false` is returned.
pub fn init_local_offset() -> bool {
    match UtcOffset::current_local_offset() {
        Ok(offset) => {
            LOCAL_OFFSET_SECS.store(offset.whole_seconds(), Ordering::Relaxed);
            true
        }
        Err(_) => false,
    }
}

fn cached_local_offset() -> UtcOffset {
    UtcOffset::from_whole_seconds(LOCAL_OFFSET_SECS.load(Ordering::Relaxed))
        .unwrap_or(UtcOffset::UTC)
}
