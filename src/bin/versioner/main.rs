//! versioner CLI - availability annotation checker for platform headers

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod check;
mod cli;

use cli::Cli;

fn main() {
    match run() {
        Ok(false) => {}
        Ok(true) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("versioner=debug")
    } else {
        EnvFilter::new("versioner=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    check::execute(cli)
}
