use crate::config::LoggerConfig;
use crate::error::{Result, TwinlogError};
use crate::logs::fs::{FileOps, OsFileOps};
use crate::logs::state::Generations;
use crate::paths::{ModuleDirResolver, PathResolver};
use chrono::Local;
use parking_lot::Mutex;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// A size-bounded log split over two files, `<base>.log` and `<base>.old.log`.
///
/// Each file holds at most half of the configured budget. When a record would
/// overflow the current file, the two files exchange names atomically and the
/// new current file is emptied, so the previous generation is always intact
/// and neither name ever disappears.
///
/// The lock only covers size accounting and rotation. The record itself is
/// written after the lock is released, so records from concurrent callers are
/// each written whole but may land in any order, and a record reserved just
/// before another thread rotates ends up in the previous generation.
///
/// The budget is therefore exact only for a single writer. Under contention a
/// late record can extend a retired generation, or land at a stale offset in
/// a freshly emptied file behind a zero-filled gap, so each file may exceed
/// its quota by the records that were in flight during a rotation.
pub struct RotatingLog {
    state: Mutex<Option<Generations>>,
    default_config: LoggerConfig,
    fs: Box<dyn FileOps>,
    resolver: Box<dyn PathResolver>,
}

impl Default for RotatingLog {
    fn default() -> Self {
        Self::new()
    }
}

impl RotatingLog {
    /// Create an uninitialized logger using the OS filesystem and
    /// module-directory path resolution
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
            default_config: LoggerConfig::default(),
            fs: Box::new(OsFileOps),
            resolver: Box::new(ModuleDirResolver),
        }
    }

    /// Configuration used by [`init_default`](Self::init_default) and auto-init
    pub fn with_default_config(mut self, config: LoggerConfig) -> Self {
        self.default_config = config;
        self
    }

    pub fn with_file_ops<F: FileOps + 'static>(mut self, fs: F) -> Self {
        self.fs = Box::new(fs);
        self
    }

    pub fn with_resolver<R: PathResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn default_config(&self) -> &LoggerConfig {
        &self.default_config
    }

    /// Open both generation files and write the startup banner.
    ///
    /// # Returns
    /// * `Ok(())` - Logger is initialized
    /// * `Err(TwinlogError::AlreadyInitialized)` - A previous `init` is still active;
    ///   its files are left untouched
    /// * `Err(TwinlogError::OpenFailed)` - One of the files could not be opened
    pub fn init(&self, config: &LoggerConfig) -> Result<()> {
        self.open(config)?;

        let banner = startup_banner();
        if (banner.len() as u64) > config.quota_per_generation() {
            tracing::debug!(
                "Startup banner does not fit quota of {} bytes, skipped",
                config.quota_per_generation()
            );
            return Ok(());
        }
        self.log(banner.as_bytes())
    }

    /// Initialize with the logger's default configuration
    pub fn init_default(&self) -> Result<()> {
        self.init(&self.default_config)
    }

    /// Like [`init`](Self::init) but without the startup banner
    pub fn open(&self, config: &LoggerConfig) -> Result<()> {
        let opened = {
            let mut state = self.state.lock();
            if state.is_some() {
                Err(TwinlogError::AlreadyInitialized)
            } else {
                self.open_locked(config).map(|generations| {
                    let summary = (
                        generations.current_path().to_path_buf(),
                        generations.quota(),
                        generations.current_size(),
                    );
                    *state = Some(generations);
                    summary
                })
            }
        };

        match opened {
            Ok((path, quota, recovered)) => {
                tracing::debug!(
                    "Logger initialized at {} (quota {} bytes, {} bytes recovered)",
                    path.display(),
                    quota,
                    recovered
                );
                Ok(())
            }
            Err(e) => {
                report(&e);
                Err(e)
            }
        }
    }

    fn open_locked(&self, config: &LoggerConfig) -> Result<Generations> {
        config.validate()?;
        let base = self.resolver.resolve(&config.base_path);
        Generations::open(&*self.fs, &base, config)
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Close both files. Does nothing if the logger is not initialized.
    pub fn uninit(&self) {
        let generations = self.state.lock().take();
        if let Some(generations) = generations {
            tracing::debug!(
                "Logger closed at {}",
                generations.current_path().display()
            );
        }
    }

    /// Append one record to the current generation.
    ///
    /// # Returns
    /// * `Ok(())` - All bytes were written
    /// * `Err(TwinlogError::RecordTooLarge)` - The record exceeds the per-generation
    ///   quota; nothing was rotated or written
    /// * `Err(TwinlogError::ShortWrite)` - The OS accepted only part of the record
    pub fn log(&self, record: &[u8]) -> Result<()> {
        let reserved = {
            let mut state = self.state.lock();
            match state.as_mut() {
                Some(generations) => generations.reserve(&*self.fs, record.len() as u64),
                None => Err(TwinlogError::NotInitialized),
            }
        };

        let reservation = reserved.map_err(|e| {
            report(&e);
            e
        })?;
        if let Some(retired) = reservation.rotated {
            tracing::debug!("Rotated log generation after {} bytes", retired);
        }

        write_record(&reservation.handle, record).map_err(|e| {
            report(&e);
            e
        })
    }

    pub fn log_str(&self, record: &str) -> Result<()> {
        self.log(record.as_bytes())
    }

    /// Append a record, adding a trailing newline if it has none
    pub fn log_line(&self, line: &str) -> Result<()> {
        if line.ends_with('\n') {
            self.log(line.as_bytes())
        } else {
            let mut record = String::with_capacity(line.len() + 1);
            record.push_str(line);
            record.push('\n');
            self.log(record.as_bytes())
        }
    }

    /// Append a record, initializing with the default configuration first if needed.
    ///
    /// A failed initialization is returned instead of the write being attempted.
    pub fn log_or_init(&self, record: &[u8]) -> Result<()> {
        if !self.is_initialized() {
            match self.init_default() {
                // Another thread won the race to initialize
                Ok(()) | Err(TwinlogError::AlreadyInitialized) => {}
                Err(e) => return Err(e),
            }
        }

        self.log(record)
    }

    /// Force a rotation now, regardless of the current size
    pub fn rotate(&self) -> Result<()> {
        let rotated = {
            let mut state = self.state.lock();
            match state.as_mut() {
                Some(generations) => generations.rotate(&*self.fs),
                None => Err(TwinlogError::NotInitialized),
            }
        };

        match rotated {
            Ok(retired) => {
                tracing::debug!("Rotated log generation on request after {} bytes", retired);
                Ok(())
            }
            Err(e) => {
                report(&e);
                Err(e)
            }
        }
    }

    /// Bytes accounted to the current generation, or `None` when not initialized
    pub fn current_size(&self) -> Option<u64> {
        self.state.lock().as_ref().map(Generations::current_size)
    }

    /// Per-generation quota, or `None` when not initialized
    pub fn quota(&self) -> Option<u64> {
        self.state.lock().as_ref().map(Generations::quota)
    }

    /// Current and previous generation paths, or `None` when not initialized
    pub fn paths(&self) -> Option<(PathBuf, PathBuf)> {
        self.state.lock().as_ref().map(|g| {
            (
                g.current_path().to_path_buf(),
                g.previous_path().to_path_buf(),
            )
        })
    }
}

fn write_record(handle: &File, record: &[u8]) -> Result<()> {
    let mut file = handle;
    match file.write(record) {
        Ok(written) if written == record.len() => Ok(()),
        Ok(written) => Err(TwinlogError::ShortWrite {
            written,
            expected: record.len(),
        }),
        Err(source) => Err(TwinlogError::WriteFailed { source }),
    }
}

/// Emit the diagnostic for a failed operation; never called with the lock held
fn report(err: &TwinlogError) {
    if err.is_caller_error() {
        tracing::warn!("{}", err);
    } else {
        tracing::error!("{}", err);
    }
}

fn startup_banner() -> String {
    format!(
        "<<<< LOGGER INIT [{}] >>>>\n",
        Local::now().format("%d-%m-%Y %H-%M-%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(temp_dir: &TempDir, budget: u64) -> LoggerConfig {
        LoggerConfig::new(temp_dir.path().join("t")).with_budget(budget)
    }

    #[test]
    fn test_new_logger_is_uninitialized() {
        let log = RotatingLog::new();
        assert!(!log.is_initialized());
        assert_eq!(log.current_size(), None);
        assert_eq!(log.quota(), None);
        assert!(log.paths().is_none());
    }

    #[test]
    fn test_log_without_init() {
        let log = RotatingLog::new();
        let result = log.log(b"hello");
        assert!(matches!(result, Err(TwinlogError::NotInitialized)));
    }

    #[test]
    fn test_init_writes_banner() {
        let temp_dir = TempDir::new().unwrap();
        let log = RotatingLog::new();
        log.init(&config_in(&temp_dir, 4096)).unwrap();

        let content = std::fs::read_to_string(temp_dir.path().join("t.log")).unwrap();
        assert!(content.starts_with("<<<< LOGGER INIT ["));
        assert!(content.ends_with(">>>>\n"));
        assert_eq!(log.current_size(), Some(content.len() as u64));
    }

    #[test]
    fn test_banner_skipped_when_quota_is_small() {
        let temp_dir = TempDir::new().unwrap();
        let log = RotatingLog::new();
        log.init(&config_in(&temp_dir, 20)).unwrap();

        assert_eq!(log.current_size(), Some(0));
        assert_eq!(std::fs::read(temp_dir.path().join("t.log")).unwrap(), b"");
    }

    #[test]
    fn test_open_skips_banner() {
        let temp_dir = TempDir::new().unwrap();
        let log = RotatingLog::new();
        log.open(&config_in(&temp_dir, 4096)).unwrap();

        assert_eq!(log.current_size(), Some(0));
    }

    #[test]
    fn test_init_rejects_invalid_budget() {
        let temp_dir = TempDir::new().unwrap();
        let log = RotatingLog::new();

        let result = log.init(&config_in(&temp_dir, 0));
        assert!(matches!(result, Err(TwinlogError::InvalidBudget(0))));
        assert!(!log.is_initialized());
        assert!(!temp_dir.path().join("t.log").exists());
    }

    #[test]
    fn test_log_line_appends_newline() {
        let temp_dir = TempDir::new().unwrap();
        let log = RotatingLog::new();
        log.open(&config_in(&temp_dir, 4096)).unwrap();

        log.log_line("one").unwrap();
        log.log_line("two\n").unwrap();

        let content = std::fs::read_to_string(temp_dir.path().join("t.log")).unwrap();
        assert_eq!(content, "one\ntwo\n");
        assert_eq!(log.current_size(), Some(8));
    }

    #[test]
    fn test_uninit_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let log = RotatingLog::new();
        log.uninit();

        log.init(&config_in(&temp_dir, 4096)).unwrap();
        log.uninit();
        log.uninit();
        assert!(!log.is_initialized());
    }

    #[test]
    fn test_rotate_requires_init() {
        let log = RotatingLog::new();
        assert!(matches!(log.rotate(), Err(TwinlogError::NotInitialized)));
    }

    #[test]
    fn test_relative_base_resolves_against_module_dir() {
        let log = RotatingLog::new();
        let relative = PathBuf::from(format!("twinlog-resolve-{}", std::process::id()));
        log.open(&LoggerConfig::new(&relative).with_budget(64)).unwrap();

        let (current, previous) = log.paths().unwrap();
        let dir = ModuleDirResolver::module_dir();
        assert_eq!(current.parent(), Some(dir.as_path()));
        log.uninit();

        let _ = std::fs::remove_file(current);
        let _ = std::fs::remove_file(previous);
    }
}
