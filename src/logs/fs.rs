// Filesystem capabilities the rotating log depends on

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::path::Path;

/// The filesystem operations used by initialization and rotation.
///
/// `exchange` must swap the two names atomically: at no point may either
/// name be missing or refer to a partially written file.
pub trait FileOps: Send + Sync {
    /// Open `path` read/write, creating it with `perm` and optionally truncating it
    fn open_generation(&self, path: &Path, perm: u32, truncate: bool) -> io::Result<File>;

    /// Atomically swap the names of two existing files
    fn exchange(&self, a: &Path, b: &Path) -> io::Result<()>;

    /// Empty the file and move its offset back to the start
    fn truncate_to_zero(&self, file: &File) -> io::Result<()> {
        file.set_len(0)?;
        let mut file = file;
        file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// Move the offset to end-of-file and return it
    fn seek_to_end(&self, file: &File) -> io::Result<u64> {
        let mut file = file;
        file.seek(SeekFrom::End(0))
    }
}

/// `FileOps` backed by the host operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileOps;

impl FileOps for OsFileOps {
    fn open_generation(&self, path: &Path, perm: u32, truncate: bool) -> io::Result<File> {
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).truncate(truncate);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(perm);
        }
        #[cfg(not(unix))]
        let _ = perm;

        options.open(path)
    }

    fn exchange(&self, a: &Path, b: &Path) -> io::Result<()> {
        exchange_names(a, b)
    }
}

// Raw syscall rather than nix's wrapper, which only exists for glibc targets
#[cfg(target_os = "linux")]
fn exchange_names(a: &Path, b: &Path) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::libc;
    use nix::NixPath;

    // <linux/fs.h>
    const RENAME_EXCHANGE: libc::c_uint = 1 << 1;

    let res = a.with_nix_path(|a| {
        b.with_nix_path(|b| unsafe {
            libc::syscall(
                libc::SYS_renameat2,
                libc::AT_FDCWD,
                a.as_ptr(),
                libc::AT_FDCWD,
                b.as_ptr(),
                RENAME_EXCHANGE,
            )
        })
    })??;

    Errno::result(res)?;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn exchange_names(_a: &Path, _b: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "atomic file name exchange is not available on this platform",
    ))
}
