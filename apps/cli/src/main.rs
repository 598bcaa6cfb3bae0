//! taskdocs CLI: resolve pipeline task documentation from the command line.
//!
//! Results and error payloads are printed as JSON on stdout; logs go to
//! stderr.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
