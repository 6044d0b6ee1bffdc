//! Karen - Brutally honest AI code review for CI
//!
//! Collects bounded evidence from a repository, asks an LLM what it
//! really thinks, and publishes the verdict: score file, markdown
//! report, append-only history, SVG badge, and optionally a README
//! badge block and a PR comment.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use karen::cli;

fn main() -> Result<()> {
    // Parse first so --log-level can seed the filter; RUST_LOG wins when set
    let cli = cli::Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .init();

    cli::run(cli)
}
