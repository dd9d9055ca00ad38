use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use common::cli::{CommonArgs, CommonCommands, utils};
use pruner::{LocalFilesystem, PolicyMap, RetentionPolicyResolver, SweepMetrics, SweepOrchestrator};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "dirprune")]
#[command(about = "dirprune - delete dated tenant directories past their retention window")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Sweep root containing one directory per tenant (overrides `base_dir`)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<DirPruneCommands>,
}

#[derive(Subcommand)]
enum DirPruneCommands {
    #[command(flatten)]
    Common(CommonCommands),
}

impl Default for DirPruneCommands {
    fn default() -> Self {
        Self::Common(CommonCommands::Sweep)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::init_logging(&cli.common)?;

    let mut config = utils::load_config(cli.common.config.as_ref())?;
    if let Some(base_dir) = cli.base_dir {
        config.base_dir = base_dir;
    }

    let command = cli.command.unwrap_or_default();
    let DirPruneCommands::Common(ref common_cmd) = command;
    if utils::handle_common_command(common_cmd, &config)? {
        return Ok(());
    }

    config.validate().context("Invalid configuration")?;

    log::info!("Loaded configuration:");
    log::info!("  Base directory: {}", config.base_dir.display());
    log::info!(
        "  Default retention: {} days, {} company policies",
        config.default.retention_days,
        config.companies.len()
    );

    let metrics = SweepMetrics::new();
    let orchestrator = SweepOrchestrator::new(
        Arc::new(LocalFilesystem::new()),
        RetentionPolicyResolver::new(PolicyMap::from_configuration(&config)),
        metrics.clone(),
    );

    let report = orchestrator
        .run(&config.base_dir, Utc::now())
        .await
        .context("Sweep aborted")?;

    metrics.summary().log();

    if report.failed_tasks > 0 {
        log::warn!("{} tenant task(s) did not complete", report.failed_tasks);
    }

    Ok(())
}
