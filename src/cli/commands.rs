//! CLI command handlers

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use kube::CustomResourceExt;

use crate::client::create_client;
use crate::config::{Config, ConfigLoader, paths};
use crate::controller::{self, Context as ControllerContext};
use crate::helm::{HelmCli, HttpIndexFetcher};
use crate::hypershift::HostedClusterExtractor;
use crate::models::{ClusterTemplate, ClusterTemplateInstance};
use crate::reconciler::{Collaborators, Reconciler};
use crate::setup::TektonTaskRunner;
use crate::store::KubeStore;

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,
    /// Validate configuration
    Validate,
    /// Show configuration file path
    Path,
}

/// Handle configuration subcommands
pub fn handle_config_command(cmd: ConfigSubcommand, explicit: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigSubcommand::Show => {
            let config = ConfigLoader::load(explicit).context("Failed to load configuration")?;
            let yaml =
                serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
            print!("{}", yaml);
        }
        ConfigSubcommand::Validate => match ConfigLoader::load(explicit) {
            Ok(_) => {
                println!("Configuration is valid");
            }
            Err(e) => {
                eprintln!("Configuration validation failed: {:#}", e);
                std::process::exit(1);
            }
        },
        ConfigSubcommand::Path => match paths::resolve_config_path(explicit) {
            Some(path) => println!("{}", path.display()),
            None => println!("(none; using built-in defaults)"),
        },
    }

    Ok(())
}

/// CRDs served by the operator as multi-document YAML
pub fn crd_manifests() -> Result<String> {
    let instance = serde_yaml::to_string(&ClusterTemplateInstance::crd())
        .context("Failed to serialize ClusterTemplateInstance CRD")?;
    let template = serde_yaml::to_string(&ClusterTemplate::crd())
        .context("Failed to serialize ClusterTemplate CRD")?;
    Ok(format!("---\n{}---\n{}", instance, template))
}

/// Build the collaborators and run the controller until shutdown
pub async fn run_operator(config: Config) -> Result<()> {
    let client = create_client().await?;

    let collaborators = Collaborators {
        store: Arc::new(KubeStore::new(client.clone())),
        installer: Arc::new(HelmCli::new(
            client.clone(),
            config.helm.binary.clone(),
            config.helm_timeout(),
        )),
        index: Arc::new(
            HttpIndexFetcher::new(config.index_fetch_timeout())
                .context("Failed to create chart index fetcher")?,
        ),
        tasks: Arc::new(TektonTaskRunner::new(client.clone())),
        extractor: Arc::new(HostedClusterExtractor::new(client.clone())),
    };

    let ctx = Arc::new(ControllerContext {
        reconciler: Reconciler::new(collaborators, config.reconciler_settings()),
        retry: config.retry_policy(),
    });

    controller::run(client, config.watch_namespace.as_deref(), ctx).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crd_manifests_contain_both_kinds() {
        let yaml = crd_manifests().unwrap();
        assert!(yaml.contains("name: clustertemplateinstances.clustertemplate.rawagner.com"));
        assert!(yaml.contains("name: clustertemplates.clustertemplate.rawagner.com"));
        assert_eq!(yaml.matches("---\n").count(), 2);
    }
}
