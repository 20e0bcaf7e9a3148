use clap::Parser;

use clipfind_core::cli::Cli;
use clipfind_core::logging;
use clipfind_core::runtime::{self, RuntimeError};

fn main() {
    let cli = Cli::parse();

    let _log_guard = match logging::init(&cli.log_level) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("[clipfind] {}", RuntimeError::Logging(error));
            std::process::exit(1);
        }
    };

    if let Err(error) = runtime::run_with_options(cli) {
        tracing::error!(%error, "clipfind failed");
        eprintln!("[clipfind] {error}");
        std::process::exit(1);
    }
}
