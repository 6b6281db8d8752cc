//! Cogload - cognitive load and cohesion analysis CLI
//!
//! A fast, local-first analysis tool that scores structural code models
//! against role-aware load ceilings and detects responsibility drift.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cogload::cli;

fn main() {
    // Parse CLI args first so --log-level can seed the filter
    let args = cli::Cli::parse();

    // Initialize logging; RUST_LOG overrides --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli::run(args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(cli::EXIT_CONFIG_ERROR);
        }
    }
}
