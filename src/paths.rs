// Path resolution for log base names

use std::path::{Path, PathBuf};

/// Suffix of the generation currently receiving writes
pub const CURRENT_SUFFIX: &str = ".log";

/// Suffix of the generation retained from before the last rotation
pub const PREVIOUS_SUFFIX: &str = ".old.log";

/// Turns a possibly relative base name into the path the logger opens
pub trait PathResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> PathBuf;
}

/// Anchors relative names at the directory of the running executable
#[derive(Debug, Default, Clone, Copy)]
pub struct ModuleDirResolver;

impl ModuleDirResolver {
    /// Directory containing the running executable, or the working directory
    /// when the executable path cannot be determined
    pub fn module_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl PathResolver for ModuleDirResolver {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.as_os_str().is_empty() {
            return Self::module_dir();
        }
        if path.is_absolute() {
            return path.to_path_buf();
        }
        Self::module_dir().join(path)
    }
}

/// Leaves paths as given (relative names stay relative to the working directory)
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityResolver;

impl PathResolver for IdentityResolver {
    fn resolve(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// Derive the current and previous generation file names from a base path.
///
/// The suffixes are appended to the full base name, so `logs/app.v2` becomes
/// `logs/app.v2.log` and `logs/app.v2.old.log`.
pub fn generation_paths(base: &Path) -> (PathBuf, PathBuf) {
    (with_suffix(base, CURRENT_SUFFIX), with_suffix(base, PREVIOUS_SUFFIX))
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
