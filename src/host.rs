//! # host: interface to the release hosting service
//!
//! Defines the [`ReleaseHost`] trait the publish pipeline talks to, plus the plain data
//! types exchanged over it. The production implementation is
//! [`crate::gitlab::GitLabClient`]; tests use the generated `MockReleaseHost`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Record returned by the host after a file upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub alt: String,
    /// Path relative to the project URL, e.g. `/uploads/<secret>/app.tar.gz`.
    pub url: String,
    #[serde(default)]
    pub full_path: String,
    #[serde(default)]
    pub markdown: String,
}

/// Name/URL pair attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseAssets {
    #[serde(default)]
    pub links: Vec<AssetLink>,
}

/// A link already attached to a release on the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseLink {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExistingAssets {
    #[serde(default)]
    pub links: Vec<ReleaseLink>,
}

/// A release as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assets: ExistingAssets,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRelease {
    pub name: String,
    pub tag_name: String,
    pub description: String,
    pub assets: ReleaseAssets,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseUpdate {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Failed to read asset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },
    #[error("Unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid request URL: {0}")]
    Url(String),
}

/// Operations the publish pipeline needs from the hosting service.
///
/// `project` is always the full `group/project` path; implementors handle encoding.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Upload a local file to the project's file store.
    async fn upload_file(&self, project: &str, path: &Path) -> Result<ProjectFile, HostError>;

    /// Fetch the release for `tag`, or `None` when there is none.
    async fn get_release(&self, project: &str, tag: &str) -> Result<Option<Release>, HostError>;

    async fn delete_release(&self, project: &str, tag: &str) -> Result<(), HostError>;

    async fn create_release(&self, project: &str, release: NewRelease)
        -> Result<Release, HostError>;

    /// Rewrite name and description of an existing release. Links are untouched.
    async fn update_release(
        &self,
        project: &str,
        tag: &str,
        update: ReleaseUpdate,
    ) -> Result<Release, HostError>;

    async fn create_asset_link(
        &self,
        project: &str,
        tag: &str,
        link: AssetLink,
    ) -> Result<AssetLink, HostError>;

    async fn delete_asset_link(&self, project: &str, tag: &str, link_id: u64)
        -> Result<(), HostError>;
}
