// Logs module - Size-bounded two-generation log files

mod fs;
mod global;
mod logger;
mod state;
mod writer;

pub use fs::{FileOps, OsFileOps};
pub use global::{global, init, is_initialized, log, uninit};
pub use logger::RotatingLog;
pub use writer::LogWriter;
