use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the rotating log writer
#[derive(Debug, Error)]
pub enum TwinlogError {
    // Lifecycle errors
    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Logger not initialized")]
    NotInitialized,

    #[error("Invalid byte budget {0}: must be at least 2 bytes (one per generation)")]
    InvalidBudget(u64),

    // Append errors
    #[error("Record of {len} bytes exceeds the per-generation quota of {quota} bytes")]
    RecordTooLarge { len: u64, quota: u64 },

    #[error("Failed to write record: {source}")]
    WriteFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("Short write: {written} of {expected} bytes written")]
    ShortWrite { written: usize, expected: usize },

    // File errors
    #[error("Failed to open log file {}: {source}", .path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to seek log file: {source}")]
    SeekFailed {
        #[source]
        source: std::io::Error,
    },

    // Rotation errors
    #[error("Failed to exchange current and previous log files: {source}")]
    RotationFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to truncate current log file: {source}")]
    TruncateFailed {
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Missing required configuration field: {0}")]
    MissingConfigField(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TwinlogError {
    /// Whether the error came from the caller (bad input or lifecycle misuse)
    /// rather than from the operating system
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            TwinlogError::AlreadyInitialized
                | TwinlogError::NotInitialized
                | TwinlogError::InvalidBudget(_)
                | TwinlogError::RecordTooLarge { .. }
                | TwinlogError::MissingConfigField(_)
                | TwinlogError::InvalidConfig(_)
        )
    }
}

impl From<TwinlogError> for std::io::Error {
    fn from(err: TwinlogError) -> Self {
        use std::io::ErrorKind;

        let kind = match &err {
            TwinlogError::RecordTooLarge { .. } | TwinlogError::InvalidBudget(_) => {
                ErrorKind::InvalidInput
            }
            TwinlogError::ShortWrite { .. } => ErrorKind::WriteZero,
            TwinlogError::NotInitialized => ErrorKind::NotConnected,
            TwinlogError::OpenFailed { source, .. }
            | TwinlogError::SeekFailed { source }
            | TwinlogError::RotationFailed { source }
            | TwinlogError::TruncateFailed { source }
            | TwinlogError::WriteFailed { source } => source.kind(),
            TwinlogError::Io(e) => e.kind(),
            _ => ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

/// Result type alias for twinlog operations
pub type Result<T> = std::result::Result<T, TwinlogError>;
