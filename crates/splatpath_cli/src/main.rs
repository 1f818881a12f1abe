// SPDX-License-Identifier: MIT OR Apache-2.0
//! `splatpath` command-line tool.
//!
//! Inspects, samples and generates camera path files and queries remote
//! export sessions.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    tracing::debug!("Starting splatpath v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = commands::run(cli).await {
        tracing::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
