use crate::error::{Result, TwinlogError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default total byte budget shared by both generations (16MB)
pub const DEFAULT_TOTAL_BUDGET: u64 = 16 * 1024 * 1024;

/// Default base name, resolved against the module directory
pub const DEFAULT_BASE_PATH: &str = "./logfile";

/// Default permission bits for newly created log files
pub const DEFAULT_CREATE_PERM: u32 = 0o666;

/// What to do with existing generation files when the logger opens them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnOpen {
    /// Empty both files on open
    #[default]
    Truncate,
    /// Keep existing content and continue size accounting from the current file's length
    Resume,
}

/// Logger configuration supplied at initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Base path; `.log` and `.old.log` are appended to it
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Total bytes allowed on disk, split evenly between the two generations
    #[serde(default = "default_total_budget")]
    pub total_budget_bytes: u64,

    /// Permission bits used when the files are created
    #[serde(default = "default_create_perm")]
    pub create_perm: u32,

    /// Open behaviour for pre-existing files
    #[serde(default)]
    pub on_open: OnOpen,
}

// Default value functions for serde
fn default_base_path() -> PathBuf {
    PathBuf::from(DEFAULT_BASE_PATH)
}

fn default_total_budget() -> u64 {
    DEFAULT_TOTAL_BUDGET
}

fn default_create_perm() -> u32 {
    DEFAULT_CREATE_PERM
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            total_budget_bytes: default_total_budget(),
            create_perm: default_create_perm(),
            on_open: OnOpen::default(),
        }
    }
}

impl LoggerConfig {
    /// Create a configuration for `base_path` with default budget and permissions
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_budget(mut self, total_budget_bytes: u64) -> Self {
        self.total_budget_bytes = total_budget_bytes;
        self
    }

    pub fn with_perm(mut self, create_perm: u32) -> Self {
        self.create_perm = create_perm;
        self
    }

    pub fn with_on_open(mut self, on_open: OnOpen) -> Self {
        self.on_open = on_open;
        self
    }

    /// Bytes each generation may hold before a rotation is required
    pub fn quota_per_generation(&self) -> u64 {
        self.total_budget_bytes / 2
    }

    /// Load a logger configuration from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<LoggerConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TwinlogError::ConfigError(format!("Failed to read config file: {}", e)))?;

        // Determine format based on file extension
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut config = match extension {
            "toml" => Self::parse_toml(&contents)?,
            "json" => Self::parse_json(&contents)?,
            _ => {
                return Err(TwinlogError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.expand_env_vars();
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML document, either flat or under a `[logger]` table
    fn parse_toml(contents: &str) -> Result<LoggerConfig> {
        #[derive(Deserialize)]
        struct ConfigFile {
            logger: Option<LoggerConfig>,
            #[serde(flatten)]
            flat: LoggerConfig,
        }

        let config_file: ConfigFile = toml::from_str(contents)
            .map_err(|e| TwinlogError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?;

        Ok(config_file.logger.unwrap_or(config_file.flat))
    }

    fn parse_json(contents: &str) -> Result<LoggerConfig> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ConfigFile {
            Nested { logger: LoggerConfig },
            Flat(LoggerConfig),
        }

        let config_file: ConfigFile = serde_json::from_str(contents)
            .map_err(|e| TwinlogError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?;

        Ok(match config_file {
            ConfigFile::Nested { logger } => logger,
            ConfigFile::Flat(config) => config,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_path.as_os_str().is_empty() {
            return Err(TwinlogError::MissingConfigField("base_path".to_string()));
        }

        // A zero quota would reject every non-empty record
        if self.total_budget_bytes < 2 {
            return Err(TwinlogError::InvalidBudget(self.total_budget_bytes));
        }

        if self.create_perm & !0o7777 != 0 {
            return Err(TwinlogError::ConfigError(format!(
                "Invalid create_perm {:o}: only permission bits are allowed",
                self.create_perm
            )));
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) {
        let path_str = self.base_path.to_string_lossy();
        self.base_path = PathBuf::from(expand_env_in_string(&path_str));
    }
}

/// Expand `$VAR` and `${VAR}` references in a string.
///
/// Unset variables and a lone `$` are left as written.
fn expand_env_in_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];

        let (name, len) = match after.strip_prefix('{') {
            Some(braced) => match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            },
            None => {
                let end = after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(after.len());
                (&after[..end], end)
            }
        };

        match std::env::var(name) {
            Ok(value) if !name.is_empty() => out.push_str(&value),
            _ => out.push_str(&rest[dollar..dollar + 1 + len]),
        }
        rest = &after[len..];
    }

    out.push_str(rest);
    out
}
