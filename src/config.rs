//! Plugin data model: build metadata handed over by the CI runner plus the
//! release settings for this step.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Build event that permits publishing a release.
pub const TAG_EVENT: &str = "tag";

/// Release name used when none is configured.
pub const DEFAULT_RELEASE_NAME: &str = "Release";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Repo {
    pub owner: String,
    pub name: String,
    pub link: String,
    pub avatar: String,
    pub branch: String,
    pub private: bool,
    pub trusted: bool,
    /// `group/project` path on the host.
    pub full_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Build {
    pub number: u64,
    pub event: String,
    pub status: String,
    pub deploy: String,
    pub created: i64,
    pub started: i64,
    pub finished: i64,
    pub link: String,
    pub tag: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Commit {
    /// Clone URL of the repository; the API host is derived from it.
    pub remote: String,
    pub sha: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub link: String,
    pub pull: String,
    pub branch: String,
    pub message: String,
    pub author: Author,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub name: String,
    pub email: String,
    pub avatar: String,
}

/// How an existing release for the same tag is handled.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseMode {
    /// Delete the existing release, then create a fresh one.
    #[default]
    Replace,
    /// Keep the existing release, rewrite its name/description and attach new links.
    Update,
}

impl std::str::FromStr for ReleaseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(ReleaseMode::Replace),
            "update" => Ok(ReleaseMode::Update),
            other => Err(format!("unsupported release mode: {other}")),
        }
    }
}

/// Step-specific parameters and secrets.
#[derive(Clone, Default, PartialEq)]
pub struct Settings {
    pub token: String,
    pub assets: Vec<String>,
    pub name: String,
    /// Overrides the API host otherwise derived from the commit remote.
    pub base_repo_url: String,
    pub release_template: String,
    pub alternative_repo_base_url: String,
    pub alternative_repo_name: String,
    pub mode: ReleaseMode,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("token", &"<redacted>")
            .field("assets", &self.assets)
            .field("name", &self.name)
            .field("base_repo_url", &self.base_repo_url)
            .field("release_template", &self.release_template)
            .field("alternative_repo_base_url", &self.alternative_repo_base_url)
            .field("alternative_repo_name", &self.alternative_repo_name)
            .field("mode", &self.mode)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plugin {
    pub repo: Repo,
    pub build: Build,
    pub commit: Commit,
    pub settings: Settings,
}

impl Plugin {
    /// Configured release name, or [`DEFAULT_RELEASE_NAME`] when blank.
    pub fn release_name(&self) -> String {
        if is_blank(&self.settings.name) {
            DEFAULT_RELEASE_NAME.to_string()
        } else {
            self.settings.name.clone()
        }
    }

    pub fn is_tag_event(&self) -> bool {
        self.build.event == TAG_EVENT
    }

    pub fn trace_loaded(&self) {
        info!(
            repo = %self.repo.full_name,
            event = %self.build.event,
            tag = %self.build.tag,
            assets_count = self.settings.assets.len(),
            mode = ?self.settings.mode,
            token_set = !self.settings.token.is_empty(),
            "Loaded plugin config"
        );
        debug!(?self, "Plugin config loaded (full debug)");
    }
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
