mod config;
mod error;
mod init;
mod object;

pub use config::LogConfig;
pub use error::{LogError, LogResult};
pub use object::{FILTER_ENV, LogFilter, LogFormat, LogTimeZone, LogTimer, init_local_offset};

/// Install the global `tracing` subscriber described by `cfg`.
///
/// Events go to stderr (or journald), never stdout. Call once per process; a second call fails
/// with [`LogError::AlreadyInitialized`]. For [`LogTimeZone::Local`] call [`init_local_offset`]
/// first, before any thread is spawned.
///
/// ```no_run
/// use shardgate_observe::{LogConfig, init_local_offset, init_logging};
///
/// init_local_offset();
/// init_logging(&LogConfig::default()).unwrap();
/// tracing::info!("ready");
/// ```
pub fn init_logging(cfg: &LogConfig) -> LogResult<()> {
    match cfg.format {
        LogFormat::Text => init::text(cfg),
        LogFormat::Json => init::json(cfg),
        LogFormat::Journald => init::journald(cfg),
    }
}
