// Library exports for twinlog, a size-bounded rotating log writer

pub mod cli;
pub mod config;
pub mod error;
pub mod logs;
pub mod paths;

pub use config::{LoggerConfig, OnOpen};
pub use error::{Result, TwinlogError};
pub use logs::{LogWriter, RotatingLog};
