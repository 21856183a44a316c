//! Release publishing pipeline: validate → render → resolve → upload → replace release.
//!
//! The pipeline is fail-fast. The first failing step aborts the run and its error is
//! returned. Nothing is uploaded for builds that are not tag events.
//!
//! Entry points are [`publish`] (talks to a [`ReleaseHost`]) and [`dry_run`], which
//! stops before any host call and reports what would be published.

use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::assets::plain_assets;
use crate::config::{is_blank, Plugin, ReleaseMode};
use crate::host::{AssetLink, HostError, NewRelease, ReleaseAssets, ReleaseHost, ReleaseUpdate};
use crate::links::{self, LinkError};
use crate::template::{render_description, TemplateError};

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("Event should be tag, got '{0}'")]
    NotTagEvent(String),
    #[error("Build has no tag to release")]
    MissingTag,
    #[error("Build has no project path (repo full name) to release to")]
    MissingProject,
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error("Assets list must have values")]
    NoAssets,
    #[error("Uploading asset {path} failed: {source}")]
    Upload {
        path: String,
        #[source]
        source: HostError,
    },
    #[error(transparent)]
    Host(#[from] HostError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseAction {
    /// No release existed for the tag.
    Created,
    /// An existing release was deleted and created again.
    Replaced,
    /// An existing release was edited in place.
    Updated,
}

#[derive(Debug)]
pub struct PublishReport {
    pub tag: String,
    pub release_name: String,
    pub action: ReleaseAction,
    pub assets: Vec<AssetLink>,
    /// Names of links on an updated release that were swapped for freshly uploaded files.
    pub replaced_links: Vec<String>,
}

/// Everything [`publish`] would do, computed without calling the host.
#[derive(Debug)]
pub struct PublishPlan {
    pub tag: String,
    pub release_name: String,
    pub description: String,
    pub api_base: Url,
    pub link_prefix: Url,
    pub assets: Vec<PathBuf>,
}

fn log_field(label: &str, value: impl std::fmt::Display) {
    info!("{:<20}: {}", label, value);
}

/// Steps shared by [`publish`] and [`dry_run`].
pub fn plan(plugin: &Plugin) -> Result<PublishPlan, ReleaseError> {
    if !plugin.is_tag_event() {
        error!(event = %plugin.build.event, "Refusing to release on a non-tag event");
        return Err(ReleaseError::NotTagEvent(plugin.build.event.clone()));
    }
    if is_blank(&plugin.build.tag) {
        return Err(ReleaseError::MissingTag);
    }
    if is_blank(&plugin.repo.full_name) {
        error!("Refusing to release without a project path");
        return Err(ReleaseError::MissingProject);
    }

    let description = render_description(plugin)?;

    let api_base = links::api_base_url(plugin)?;
    log_field("Base URL", &api_base);
    log_field("Repo Full Name", &plugin.repo.full_name);
    let link_prefix = links::asset_link_prefix(plugin, &api_base)?;
    log_field("Repo URL", &link_prefix);

    let assets = plain_assets(&plugin.settings.assets);
    if assets.is_empty() {
        error!(patterns = ?plugin.settings.assets, "No asset matched any pattern");
        return Err(ReleaseError::NoAssets);
    }

    Ok(PublishPlan {
        tag: plugin.build.tag.clone(),
        release_name: plugin.release_name(),
        description,
        api_base,
        link_prefix,
        assets,
    })
}

/// Resolves and renders everything but performs no upload or release call.
pub fn dry_run(plugin: &Plugin) -> Result<PublishPlan, ReleaseError> {
    let plan = plan(plugin)?;
    info!(assets = plan.assets.len(), tag = %plan.tag, "Dry run: nothing uploaded");
    Ok(plan)
}

/// Uploads every asset, then creates (or replaces, or updates) the release for the tag.
pub async fn publish<H>(plugin: &Plugin, host: &H) -> Result<PublishReport, ReleaseError>
where
    H: ReleaseHost + ?Sized,
{
    let plan = plan(plugin)?;
    let project = plugin.repo.full_name.as_str();

    let asset_links = upload_assets(host, project, &plan).await?;

    let existing = host
        .get_release(project, &plan.tag)
        .await?
        .filter(|release| !is_blank(&release.tag_name));

    let mut replaced_links = Vec::new();
    let action = match (existing, plugin.settings.mode) {
        (Some(release), ReleaseMode::Update) => {
            // Link names are unique per release; drop same-named links before touching anything else.
            for stale in release
                .assets
                .links
                .iter()
                .filter(|old| asset_links.iter().any(|new| new.name == old.name))
            {
                warn!(tag = %plan.tag, link = %stale.name, "Replacing existing release link");
                host.delete_asset_link(project, &plan.tag, stale.id).await?;
                replaced_links.push(stale.name.clone());
            }
            info!(tag = %plan.tag, "Updating existing release");
            host.update_release(
                project,
                &plan.tag,
                ReleaseUpdate {
                    name: plan.release_name.clone(),
                    description: plan.description.clone(),
                },
            )
            .await?;
            for link in &asset_links {
                host.create_asset_link(project, &plan.tag, link.clone()).await?;
            }
            ReleaseAction::Updated
        }
        (Some(_), ReleaseMode::Replace) => {
            warn!(tag = %plan.tag, "Release already exists, deleting it");
            host.delete_release(project, &plan.tag).await?;
            create_release(host, project, &plan, &asset_links).await?;
            ReleaseAction::Replaced
        }
        (None, _) => {
            create_release(host, project, &plan, &asset_links).await?;
            ReleaseAction::Created
        }
    };

    info!(tag = %plan.tag, ?action, assets = asset_links.len(), "Release published");
    Ok(PublishReport {
        tag: plan.tag,
        release_name: plan.release_name,
        action,
        assets: asset_links,
        replaced_links,
    })
}

async fn upload_assets<H>(
    host: &H,
    project: &str,
    plan: &PublishPlan,
) -> Result<Vec<AssetLink>, ReleaseError>
where
    H: ReleaseHost + ?Sized,
{
    info!("Uploading assets...");
    let mut uploaded = Vec::with_capacity(plan.assets.len());

    for asset in &plan.assets {
        log_field("Uploading asset", asset.display());
        let project_file = host.upload_file(project, asset).await.map_err(|source| {
            error!(asset = %asset.display(), error = %source, "Upload failed");
            ReleaseError::Upload {
                path: asset.display().to_string(),
                source,
            }
        })?;
        log_field("Done", &project_file.url);

        let name = if is_blank(&project_file.alt) {
            asset
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| asset.display().to_string())
        } else {
            project_file.alt.clone()
        };
        uploaded.push(AssetLink {
            name,
            url: links::asset_url(&plan.link_prefix, &project_file.url),
        });
    }

    info!("Upload successful.");
    Ok(uploaded)
}

async fn create_release<H>(
    host: &H,
    project: &str,
    plan: &PublishPlan,
    links: &[AssetLink],
) -> Result<(), ReleaseError>
where
    H: ReleaseHost + ?Sized,
{
    let release = NewRelease {
        name: plan.release_name.clone(),
        tag_name: plan.tag.clone(),
        description: plan.description.clone(),
        assets: ReleaseAssets {
            links: links.to_vec(),
        },
    };
    let created = host.create_release(project, release).await?;
    match serde_json::to_string_pretty(&created) {
        Ok(json) => debug!(json = %json, "Created release"),
        Err(e) => warn!(error = ?e, "Failed to serialize created release"),
    }
    Ok(())
}
