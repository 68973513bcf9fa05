//! Qualshift CLI - Command-line interface
//!
//! Drives a simulated page session for trying out quality commands
//! without a host page.

mod commands;

use clap::Parser;
use qualshift_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "qualshift")]
#[command(about = "Playback quality control, simulated")]
struct Cli {
    /// Console log level
    #[arg(long, default_value_t = CliLogLevel::Warn)]
    log_level: CliLogLevel,

    /// Raw levels the simulated player offers, highest first
    #[arg(long, value_delimiter = ',', default_value = "auto,hd2160,hd1080,hd720,medium,tiny")]
    levels: Vec<String>,

    /// Level the simulated player starts on
    #[arg(long, default_value = "hd1080")]
    current: String,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), None)
        .map_err(|error| anyhow::anyhow!("tracing setup failed: {error}"))?;

    commands::handle_command(cli.command, &cli.levels, &cli.current).await?;

    Ok(())
}
