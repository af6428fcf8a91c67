use tracing_subscriber::EnvFilter;
use twinlog::cli::{self, Cli};

fn main() {
    // Diagnostics go to stderr so `tee --echo` output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = Cli::run() {
        cli::print_error(&e.to_string());
        std::process::exit(1);
    }
}
