// The two generation files and their size accounting

use crate::config::{LoggerConfig, OnOpen};
use crate::error::{Result, TwinlogError};
use crate::logs::fs::FileOps;
use crate::paths::generation_paths;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of a successful [`Generations::reserve`]
pub(crate) struct Reservation {
    /// Handle the record must be written to
    pub(crate) handle: Arc<File>,
    /// Bytes in the generation retired by a rotation, if one happened
    pub(crate) rotated: Option<u64>,
}

/// Open state of an initialized logger.
///
/// Only reachable through the logger's lock, so every `&mut self` method here
/// runs with exclusive access. `current` always refers to the file named
/// `current_path` once a method returns successfully.
pub(crate) struct Generations {
    current_path: PathBuf,
    previous_path: PathBuf,
    current: Arc<File>,
    previous: Arc<File>,
    quota: u64,
    current_size: u64,
}

impl Generations {
    /// Open (creating as needed) both generation files next to `base`
    pub(crate) fn open(fs: &dyn FileOps, base: &Path, config: &LoggerConfig) -> Result<Self> {
        let truncate = config.on_open == OnOpen::Truncate;
        let (current_path, previous_path) = generation_paths(base);

        let current = open_one(fs, &current_path, config.create_perm, truncate)?;
        let previous = open_one(fs, &previous_path, config.create_perm, truncate)?;

        let current_size = fs
            .seek_to_end(&current)
            .map_err(|source| TwinlogError::SeekFailed { source })?;

        let mut generations = Self {
            current_path,
            previous_path,
            current: Arc::new(current),
            previous: Arc::new(previous),
            quota: config.quota_per_generation(),
            current_size,
        };

        // A resumed file may be larger than the quota of the new configuration
        if generations.current_size > generations.quota {
            generations.rotate(fs)?;
        }

        Ok(generations)
    }

    /// Account for a record of `len` bytes, rotating first if it would not fit.
    ///
    /// Nothing is logged from here: callers hold the logger's lock, and a
    /// `tracing` subscriber may itself write into this logger.
    pub(crate) fn reserve(&mut self, fs: &dyn FileOps, len: u64) -> Result<Reservation> {
        if len > self.quota {
            return Err(TwinlogError::RecordTooLarge {
                len,
                quota: self.quota,
            });
        }

        let mut rotated = None;
        if self.current_size + len > self.quota {
            rotated = Some(self.rotate(fs)?);
        }

        self.current_size += len;
        Ok(Reservation {
            handle: Arc::clone(&self.current),
            rotated,
        })
    }

    /// Exchange the two files on disk, swap handle roles, and empty the new current file.
    ///
    /// Returns the number of bytes the retired generation was accounted for.
    pub(crate) fn rotate(&mut self, fs: &dyn FileOps) -> Result<u64> {
        fs.exchange(&self.current_path, &self.previous_path)
            .map_err(|source| TwinlogError::RotationFailed { source })?;

        // The names are swapped on disk, so the handles must follow
        std::mem::swap(&mut self.current, &mut self.previous);

        if let Err(source) = fs.truncate_to_zero(&self.current) {
            // Keep accounting honest about whatever the new current file still holds
            self.current_size = self
                .current
                .metadata()
                .map(|m| m.len())
                .unwrap_or(self.quota)
                .min(self.quota);
            return Err(TwinlogError::TruncateFailed { source });
        }

        Ok(std::mem::take(&mut self.current_size))
    }

    pub(crate) fn current_size(&self) -> u64 {
        self.current_size
    }

    pub(crate) fn quota(&self) -> u64 {
        self.quota
    }

    pub(crate) fn current_path(&self) -> &Path {
        &self.current_path
    }

    pub(crate) fn previous_path(&self) -> &Path {
        &self.previous_path
    }
}

fn open_one(fs: &dyn FileOps, path: &Path, perm: u32, truncate: bool) -> Result<File> {
    fs.open_generation(path, perm, truncate)
        .map_err(|source| TwinlogError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })
}
