//! Command-line surface for `gitlab-release`.
//!
//! [`Cli`] defines the user-facing options. [`run`] is the async entrypoint used by
//! `main()` and by integration tests. Without a subcommand the binary behaves like
//! `publish` with no flags, which is how CI plugin images invoke it.
use crate::gitlab::GitLabClient;
use crate::links::api_base_url;
use crate::load_config::load_config;
use crate::release::{dry_run, publish};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(
    name = "gitlab-release",
    version,
    about = "Upload build assets to GitLab and publish a release for the pushed tag"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload the matching assets and create (or replace) the release for the build tag
    Publish {
        /// Optional YAML file with non-secret release settings
        #[clap(long)]
        config: Option<PathBuf>,
        /// Resolve assets and render the description without calling GitLab
        #[clap(long)]
        dry_run: bool,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let command = cli.command.unwrap_or(Commands::Publish {
        config: None,
        dry_run: false,
    });

    match command {
        Commands::Publish {
            config,
            dry_run: true,
        } => {
            let plugin = load_config(config.as_deref())?;
            let plan = dry_run(&plugin).context("Dry run failed")?;
            println!("Dry run for tag {} ({}).", plan.tag, plan.release_name);
            println!("Links will point at {}", plan.link_prefix);
            for asset in &plan.assets {
                println!("  would upload {}", asset.display());
            }
            println!("Description:\n{}", plan.description);
            Ok(())
        }
        Commands::Publish {
            config,
            dry_run: false,
        } => {
            let plugin = load_config(config.as_deref())?;
            tracing::info!(command = "publish", "Starting release publication");
            let base = api_base_url(&plugin).context("Cannot determine GitLab host")?;
            let client = GitLabClient::new(&base, plugin.settings.token.clone())?;
            match publish(&plugin, &client).await {
                Ok(report) => {
                    tracing::info!(command = "publish", ?report, "Publication complete");
                    println!("Release published.\nReport:");
                    println!("{:#?}", report);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "publish", error = %e, "Publication failed");
                    Err(anyhow::Error::new(e).context("Release publication failed"))
                }
            }
        }
    }
}
