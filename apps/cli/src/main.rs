//! ContentGraph CLI — materialize a content space into a typed document graph.
//!
//! Fetches every entry and asset from the configured space, resolves them
//! against a local schema, and emits a hashed document cache.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
