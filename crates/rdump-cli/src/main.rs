mod cli;

use crate::cli::Cli;
use clap::Parser;

fn main() {
    let cli = Cli::parse();

    // Failures are already logged (unless quiet); only the exit code is left.
    if let Err(err) = cli.run() {
        tracing::debug!("exiting with failure: {:#}", err);
        std::process::exit(1);
    }
}
