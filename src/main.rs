mod classify;
mod cli;
mod config;
mod engine;
mod error;
mod github;
mod jenkins;
mod matcher;
mod model;
mod output;
mod parameters;
mod secrets;
mod server;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("github2jenkins {} starting", env!("CARGO_PKG_VERSION"));
    cli.execute().await
}
