use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Common CLI arguments shared by the sweep binary and its helpers
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    #[arg(long, help = "Configuration file path (TOML or JSON)")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        help = "Logging level or filter directive (e.g. debug, info, pruner=trace)"
    )]
    pub level: Option<String>,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,
}

/// Subcommands available to the sweep binary
#[derive(Subcommand, Debug, Clone, Default)]
pub enum CommonCommands {
    /// Run one sweep over the configured base directory (default behavior)
    #[default]
    Sweep,
    /// Show current configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
    /// Validate configuration and exit
    Validate,
    /// Show version information and exit
    Version,
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::Configuration;
    use anyhow::{Context, Result};
    use std::str::FromStr;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::LevelFilter;

    /// Resolve the log filter directive from CLI arguments.
    ///
    /// An explicit `--level` wins over `--verbose`/`--quiet`.
    pub fn log_directive(args: &CommonArgs) -> String {
        if let Some(level) = &args.level {
            level.clone()
        } else if args.quiet {
            "warn".to_string()
        } else if args.verbose {
            "debug".to_string()
        } else {
            "info".to_string()
        }
    }

    /// Build the log filter for the given arguments.
    ///
    /// A bare word must be a level name; anything else is parsed as an
    /// `EnvFilter` directive list.
    pub fn build_filter(args: &CommonArgs) -> Result<EnvFilter> {
        let directive = log_directive(args);
        let is_bare_level = !directive.contains(['=', ',', ':', '[']);
        if is_bare_level {
            let level = LevelFilter::from_str(&directive)
                .with_context(|| format!("Invalid logging level '{directive}'"))?;
            return Ok(EnvFilter::default().add_directive(level.into()));
        }

        EnvFilter::try_new(&directive)
            .with_context(|| format!("Invalid logging level '{directive}'"))
    }

    /// Initialize logging based on CLI arguments.
    ///
    /// Fails on an unparseable level so a typo never silently runs a sweep
    /// with the wrong verbosity.
    pub fn init_logging(args: &CommonArgs) -> Result<()> {
        let filter = build_filter(args)?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;

        Ok(())
    }

    /// Load configuration with optional override from CLI
    pub fn load_config(config_path: Option<&PathBuf>) -> Result<Configuration> {
        match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Configuration::load_from_path(path).context("Failed to load configuration")
            }
            None => Configuration::load().context("Failed to load configuration"),
        }
    }

    /// Display configuration in human-readable or JSON format
    pub fn display_config(config: &Configuration, json: bool) -> Result<()> {
        if json {
            let json = serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration to JSON")?;
            println!("{json}");
        } else {
            println!("dirprune Configuration:");
            println!("=======================");
            println!("Base directory: {}", config.base_dir.display());
            println!(
                "Default retention: {} days ({})",
                config.default.retention_days, config.default.company_name
            );

            if config.companies.is_empty() {
                println!("Company policies: none");
            } else {
                println!("Company policies:");
                for company in &config.companies {
                    println!(
                        "  {} [{}]: {} days",
                        company.company_id, company.company_name, company.retention_days
                    );
                }
            }
        }
        Ok(())
    }

    /// Validate configuration and report any issues
    pub fn validate_config(config: &Configuration) -> Result<()> {
        log::info!("Validating configuration...");

        config.validate().context("Configuration validation failed")?;

        for policy in config.invalid_policies() {
            log::warn!(
                "Retention time [{}] for company {} [{}] is not a number; this tenant will be skipped",
                policy.retention_days,
                policy.company_name,
                policy.company_id
            );
        }

        log::info!("Configuration validation passed");
        Ok(())
    }

    /// Handle commands that don't run a sweep.
    ///
    /// Returns `true` when the command was handled and the process should exit.
    pub fn handle_common_command(command: &CommonCommands, config: &Configuration) -> Result<bool> {
        match command {
            CommonCommands::Config { json } => {
                display_config(config, *json)?;
                Ok(true)
            }
            CommonCommands::Validate => {
                validate_config(config)?;
                Ok(true)
            }
            CommonCommands::Version => {
                println!("{}", version_info());
                Ok(true)
            }
            CommonCommands::Sweep => Ok(false),
        }
    }

    /// Standard version information
    pub fn version_info() -> String {
        format!(
            "{} {} ({})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_RUST_VERSION")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configuration, RetentionPolicy};

    #[test]
    fn test_common_commands_default() {
        assert!(matches!(CommonCommands::default(), CommonCommands::Sweep));
    }

    #[test]
    fn test_version_info() {
        let version = utils::version_info();
        assert!(version.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_log_directive_precedence() {
        let mut args = CommonArgs::default();
        assert_eq!(utils::log_directive(&args), "info");

        args.verbose = true;
        assert_eq!(utils::log_directive(&args), "debug");

        args.verbose = false;
        args.quiet = true;
        assert_eq!(utils::log_directive(&args), "warn");

        args.level = Some("trace".to_string());
        assert_eq!(utils::log_directive(&args), "trace");
    }

    #[test]
    fn test_build_filter_rejects_unknown_level() {
        let args = CommonArgs {
            level: Some("loud".to_string()),
            ..Default::default()
        };
        assert!(utils::build_filter(&args).is_err());

        let args = CommonArgs {
            level: Some("debug".to_string()),
            ..Default::default()
        };
        assert!(utils::build_filter(&args).is_ok());

        let args = CommonArgs {
            level: Some("info,pruner=trace".to_string()),
            ..Default::default()
        };
        assert!(utils::build_filter(&args).is_ok());
    }

    #[test]
    fn test_validate_config_tolerates_bad_retention_value() {
        let config = Configuration {
            companies: vec![RetentionPolicy::new("acme", "Acme", "abc")],
            ..Default::default()
        };
        assert!(utils::validate_config(&config).is_ok());
    }

    #[test]
    fn test_sweep_is_not_handled() {
        let config = Configuration::default();
        let handled = utils::handle_common_command(&CommonCommands::Sweep, &config).unwrap();
        assert!(!handled);
    }
}
