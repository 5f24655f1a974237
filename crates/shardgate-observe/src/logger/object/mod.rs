mod filter;
pub use filter::{FILTER_ENV, LogFilter};

mod format;
pub use format::LogFormat;

mod timer;
pub use timer::LogTimer;

mod timezone;
pub use timezone::{LogTimeZone, init_local_offset};
