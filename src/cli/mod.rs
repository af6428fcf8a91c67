// CLI module - Feed a rotating log pair from the shell

mod output;

pub use output::print_error;

use crate::config::{LoggerConfig, OnOpen};
use crate::error::{Result, TwinlogError};
use crate::logs::RotatingLog;
use crate::paths::{generation_paths, IdentityResolver};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// twinlog - Size-bounded current/previous log files
#[derive(Parser)]
#[command(name = "twinlog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append every line read from stdin to the log
    Tee {
        #[command(flatten)]
        target: TargetArgs,

        /// Total byte budget shared by both files
        #[arg(short, long)]
        budget: Option<u64>,

        /// Permission bits for newly created files (octal)
        #[arg(short, long, value_parser = parse_octal)]
        perm: Option<u32>,

        /// Keep existing content instead of truncating both files
        #[arg(short, long)]
        resume: bool,

        /// Also copy each line to stdout
        #[arg(short, long)]
        echo: bool,
    },

    /// Rotate an existing log pair once
    Rotate {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Show both generation files and their sizes
    Status {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Base path; `.log` and `.old.log` are appended
    #[arg(long)]
    base: Option<PathBuf>,

    /// Load settings from a TOML or JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl TargetArgs {
    /// Config file settings (or defaults), with `--base` taking precedence
    fn load(&self) -> Result<LoggerConfig> {
        let mut config = match &self.config {
            Some(path) => LoggerConfig::from_file(path)?,
            None => LoggerConfig::default(),
        };
        if let Some(base) = &self.base {
            config.base_path = base.clone();
        }
        Ok(config)
    }
}

impl Cli {
    /// Run the CLI application
    pub fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute()
    }

    fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Tee {
                target,
                budget,
                perm,
                resume,
                echo,
            } => {
                let mut config = target.load()?;
                if let Some(budget) = budget {
                    config.total_budget_bytes = *budget;
                }
                if let Some(perm) = perm {
                    config.create_perm = *perm;
                }
                if *resume {
                    config.on_open = OnOpen::Resume;
                }

                let stdin = io::stdin();
                let stdout = io::stdout();
                let echo = if *echo { Some(stdout.lock()) } else { None };
                let lines = tee(&config, stdin.lock(), echo)?;
                output::print_success(&format!("{} lines logged", lines));
                Ok(())
            }

            Commands::Rotate { target } => {
                // The pair may have been written under a larger budget than the
                // loaded one; an unbounded quota keeps open from rotating on its own
                let config = target
                    .load()?
                    .with_on_open(OnOpen::Resume)
                    .with_budget(u64::MAX);
                let log = RotatingLog::new().with_resolver(IdentityResolver);
                log.open(&config)?;
                log.rotate()?;
                log.uninit();

                let (current, previous) = generation_paths(&config.base_path);
                output::print_success(&format!(
                    "Rotated {} -> {}",
                    current.display(),
                    previous.display()
                ));
                Ok(())
            }

            Commands::Status { target } => {
                let config = target.load()?;
                output::print_status(&config, &status_rows(&config.base_path));
                Ok(())
            }
        }
    }
}

/// Copy lines from `input` into a freshly opened log, optionally echoing them.
///
/// Lines longer than the per-generation quota are skipped with a warning;
/// any other logging failure stops the copy. Returns the number of lines logged.
pub fn tee<R: BufRead, W: Write>(
    config: &LoggerConfig,
    mut input: R,
    mut echo: Option<W>,
) -> Result<usize> {
    let log = RotatingLog::new().with_resolver(IdentityResolver);
    log.init(config)?;

    let mut line = String::new();
    let mut logged = 0;

    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        if let Some(out) = echo.as_mut() {
            out.write_all(line.as_bytes())?;
        }

        match log.log(line.as_bytes()) {
            Ok(()) => logged += 1,
            // Reported by the logger; the line is dropped
            Err(TwinlogError::RecordTooLarge { .. }) => {}
            Err(e) => return Err(e),
        }
    }

    log.uninit();
    Ok(logged)
}

/// Role, path, and size (if the file exists) for both generations
fn status_rows(base: &Path) -> Vec<(&'static str, PathBuf, Option<u64>)> {
    let (current, previous) = generation_paths(base);
    [("current", current), ("previous", previous)]
        .into_iter()
        .map(|(role, path)| {
            let size = std::fs::metadata(&path).ok().map(|m| m.len());
            (role, path, size)
        })
        .collect()
}

/// Parse permission bits given in octal, with or without a `0o` prefix
fn parse_octal(s: &str) -> std::result::Result<u32, String> {
    let digits = s.trim_start_matches("0o");
    u32::from_str_radix(digits, 8).map_err(|e| format!("invalid octal permission '{}': {}", s, e))
}
