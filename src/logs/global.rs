// Process-wide logger for callers that don't carry a `RotatingLog` around

use crate::config::LoggerConfig;
use crate::error::Result;
use crate::logs::RotatingLog;
use std::sync::OnceLock;

static GLOBAL: OnceLock<RotatingLog> = OnceLock::new();

/// The shared process-wide logger, created uninitialized on first use
pub fn global() -> &'static RotatingLog {
    GLOBAL.get_or_init(RotatingLog::new)
}

/// Initialize the process-wide logger
pub fn init(config: &LoggerConfig) -> Result<()> {
    global().init(config)
}

pub fn is_initialized() -> bool {
    global().is_initialized()
}

pub fn uninit() {
    global().uninit()
}

/// Append a record to the process-wide logger, initializing it with defaults if needed
pub fn log(record: &[u8]) -> Result<()> {
    global().log_or_init(record)
}
