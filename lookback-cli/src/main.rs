//! Binary crate for the `lookback` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive address entry and configuration
//! - Human-friendly output, notifications and loading status on the terminal

use clap::Parser;

mod cli;
mod logging;
mod render;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    logging::init(cmd.verbose)?;
    cmd.run().await
}
