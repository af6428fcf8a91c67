use crate::logs::RotatingLog;
use chrono::{DateTime, Local};
use std::cell::Cell;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

thread_local! {
    static WRITING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as inside `LogWriter::write` until dropped
struct WriteGuard;

impl WriteGuard {
    /// `None` if this thread is already writing through a `LogWriter`
    fn enter() -> Option<Self> {
        WRITING.with(|writing| (!writing.replace(true)).then(|| WriteGuard))
    }
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        WRITING.with(|writing| writing.set(false));
    }
}

/// LogWriter exposes a shared `RotatingLog` as an `io::Write` sink.
///
/// Every `write` call becomes exactly one record, so a `tracing` subscriber
/// using this as its writer produces one record per event. The logger is
/// initialized with its default configuration on first write if needed.
///
/// Records produced while the same thread is already inside a `LogWriter`
/// write are dropped. The logger reports its own failures through `tracing`,
/// and with this writer installed as the global subscriber's sink those
/// reports would otherwise feed back into the failing logger.
#[derive(Clone)]
pub struct LogWriter {
    log: Arc<RotatingLog>,
    /// Prefix each record with a local timestamp
    timestamps: bool,
}

impl LogWriter {
    /// Create a writer that passes bytes through unchanged
    pub fn new(log: Arc<RotatingLog>) -> Self {
        Self {
            log,
            timestamps: false,
        }
    }

    /// Create a writer that prefixes records with `[YYYY-MM-DD HH:MM:SS.mmm] `
    /// and terminates them with a newline
    pub fn with_timestamps(log: Arc<RotatingLog>) -> Self {
        Self {
            log,
            timestamps: true,
        }
    }

    /// The logger this writer appends to
    pub fn log(&self) -> &RotatingLog {
        &self.log
    }

    /// Format a log entry with timestamp
    fn format_log_entry(timestamp: &DateTime<Local>, data: &[u8]) -> Vec<u8> {
        let timestamp_str = timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        let mut entry = Vec::with_capacity(timestamp_str.len() + 4 + data.len());

        // Format: [YYYY-MM-DD HH:MM:SS.mmm] <data>
        entry.extend_from_slice(b"[");
        entry.extend_from_slice(timestamp_str.as_bytes());
        entry.extend_from_slice(b"] ");
        entry.extend_from_slice(data);

        if !data.ends_with(b"\n") {
            entry.push(b'\n');
        }

        entry
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let Some(_guard) = WriteGuard::enter() else {
            return Ok(buf.len());
        };

        if self.timestamps {
            let entry = Self::format_log_entry(&Local::now(), buf);
            self.log.log_or_init(&entry)?;
        } else {
            self.log.log_or_init(buf)?;
        }

        Ok(buf.len())
    }

    // Records are written straight to the file; nothing is buffered here
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
