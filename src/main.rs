//! Cluster Templates Operator
//!
//! Drives ClusterTemplateInstances from a Helm chart install to a running,
//! fully set-up cluster.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cluster_templates_operator::cli::{self, ConfigSubcommand};
use cluster_templates_operator::config::ConfigLoader;

/// Kubernetes operator for ClusterTemplateInstances
#[derive(Parser, Debug)]
#[command(name = "cluster-templates-operator")]
#[command(about = "Reconciles ClusterTemplateInstances into provisioned clusters", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,

    /// Write logs to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Configuration file
    #[arg(long, short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Run the controller (default)
    Run,
    /// Print the CustomResourceDefinitions as YAML
    Crd,
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command.unwrap_or(Command::Run) {
        Command::Crd => {
            print!("{}", cli::crd_manifests()?);
            Ok(())
        }
        Command::Config { subcommand } => {
            cli::handle_config_command(subcommand, args.config.as_deref())
        }
        Command::Version => {
            cli::display_version();
            Ok(())
        }
        Command::Run => {
            cli::init_logging(args.debug, args.log_file.as_deref())?;
            if let Some(ref log_path) = args.log_file {
                eprintln!("Logs written to: {}", log_path.display());
            }

            let config = ConfigLoader::load(args.config.as_deref())
                .context("Failed to load configuration")?;
            tracing::debug!(
                watch_namespace = ?config.watch_namespace,
                requeue_after_secs = config.requeue_after_secs,
                "configuration loaded"
            );

            cli::run_operator(config).await
        }
    }
}
