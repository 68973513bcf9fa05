//! CLI command implementations

use anyhow::Context;
use clap::Subcommand;
use qualshift_core::quality::{QualityInfo, QualityLevel};
use qualshift_sim::SimHarness;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show current and offered quality levels
    Info,
    /// Step playback toward a higher resolution
    Up,
    /// Step playback toward a lower resolution
    Down,
    /// Jump to the highest offered level
    Highest,
    /// Jump to the lowest offered level
    Lowest,
    /// Apply a specific level by identifier
    Set {
        /// Level identifier, e.g. hd720
        level: String,
    },
    /// Walk through every command against the simulated player
    Demo,
}

/// Handles a parsed CLI command against a fresh simulated session.
pub async fn handle_command(
    command: Commands,
    levels: &[String],
    current: &str,
) -> anyhow::Result<()> {
    let ids: Vec<&str> = levels.iter().map(String::as_str).collect();
    let harness = SimHarness::builder().levels(&ids).current(current).build();

    match command {
        Commands::Info => {
            let report = harness
                .relay
                .quality_info()
                .await
                .context("could not query the player")?;
            match &report.current {
                Some(info) => println!("current: {}", format_info(info)),
                None => println!("current: (unknown)"),
            }
            println!("offered:");
            for info in &report.available {
                println!("  {} ({})", info.id, format_info(info));
            }
        }
        Commands::Up => {
            report_outcome(harness.relay.increase_quality().await?);
        }
        Commands::Down => {
            report_outcome(harness.relay.decrease_quality().await?);
        }
        Commands::Highest => {
            report_outcome(harness.relay.highest_quality().await?);
        }
        Commands::Lowest => {
            report_outcome(harness.relay.lowest_quality().await?);
        }
        Commands::Set { level } => {
            report_outcome(
                harness
                    .relay
                    .set_specific_quality(QualityLevel::new(level))
                    .await?,
            );
        }
        Commands::Demo => run_demo(&harness).await?,
    }

    Ok(())
}

async fn run_demo(harness: &SimHarness) -> anyhow::Result<()> {
    println!("starting at {}", current_label(harness).await?);

    println!("stepping down twice...");
    harness.relay.decrease_quality().await?;
    harness.relay.decrease_quality().await?;
    println!("  now {}", current_label(harness).await?);

    println!("stepping up once...");
    harness.relay.increase_quality().await?;
    println!("  now {}", current_label(harness).await?);

    println!("jumping to lowest...");
    harness.relay.lowest_quality().await?;
    println!("  now {}", current_label(harness).await?);

    println!("jumping to highest...");
    harness.relay.highest_quality().await?;
    println!("  now {}", current_label(harness).await?);

    println!("indicator flashes:");
    for label in harness.indicator.shown_labels() {
        println!("  {label}");
    }

    Ok(())
}

async fn current_label(harness: &SimHarness) -> anyhow::Result<String> {
    let report = harness
        .relay
        .quality_info()
        .await
        .context("could not query the player")?;
    Ok(report
        .current
        .map(|info| format_info(&info))
        .unwrap_or_else(|| "(unknown)".to_string()))
}

fn report_outcome(confirmed: Option<QualityInfo>) {
    match confirmed {
        Some(info) => println!("now {}", format_info(&info)),
        None => println!("command sent"),
    }
}

fn format_info(info: &QualityInfo) -> String {
    match &info.tag {
        Some(tag) => format!("{} [{tag}]", info.label),
        None => info.label.clone(),
    }
}
