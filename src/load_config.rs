//! Configuration loading: an optional YAML settings file overlaid by the CI
//! environment, which also carries the token and the build metadata.

use crate::config::{Author, Build, Commit, Plugin, ReleaseMode, Repo, Settings};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{error, info};

/// Static, secret-free settings that may live in a YAML file next to the pipeline.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StaticConfig {
    assets: Vec<String>,
    name: Option<String>,
    base_repo_url: Option<String>,
    release_template: Option<String>,
    alternative_repo_base_url: Option<String>,
    alternative_repo_name: Option<String>,
    mode: Option<ReleaseMode>,
}

/// Loads the optional YAML settings file and overlays the process environment
/// (plugin settings, token, CI build metadata).
pub fn load_config(path: Option<&Path>) -> Result<Plugin> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] but reads variables through `lookup`.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<Plugin>
where
    F: Fn(&str) -> Option<String>,
{
    let static_conf = match path {
        Some(path) => read_static_config(path)?,
        None => {
            info!("No config file given, using environment only");
            StaticConfig::default()
        }
    };

    let var = |key: &str| lookup(key).unwrap_or_default();
    let overlay = |key: &str, file_value: Option<String>| -> String {
        lookup(key).or(file_value).unwrap_or_default()
    };

    let token = lookup("PLUGIN_TOKEN")
        .filter(|t| !t.trim().is_empty())
        .or_else(|| lookup("GITLAB_TOKEN").filter(|t| !t.trim().is_empty()));
    let token = match token {
        Some(token) => {
            info!("Token found in env");
            token
        }
        None => {
            error!("PLUGIN_TOKEN / GITLAB_TOKEN environment variable not set");
            anyhow::bail!("PLUGIN_TOKEN (or GITLAB_TOKEN) environment variable not set");
        }
    };

    let assets = match lookup("PLUGIN_ASSETS") {
        Some(raw) => split_list(&raw),
        None => static_conf.assets,
    };

    let mode = match lookup("PLUGIN_MODE") {
        Some(raw) => ReleaseMode::from_str(&raw).map_err(|e| {
            error!(error = %e, "PLUGIN_MODE is invalid");
            anyhow::anyhow!("PLUGIN_MODE: {e}")
        })?,
        None => static_conf.mode.unwrap_or_default(),
    };

    let settings = Settings {
        token,
        assets,
        name: overlay("PLUGIN_NAME", static_conf.name),
        base_repo_url: overlay("PLUGIN_BASE_REPO_URL", static_conf.base_repo_url),
        release_template: overlay("PLUGIN_RELEASE_TEMPLATE", static_conf.release_template),
        alternative_repo_base_url: overlay(
            "PLUGIN_ALTERNATIVE_REPO_BASE_URL",
            static_conf.alternative_repo_base_url,
        ),
        alternative_repo_name: overlay(
            "PLUGIN_ALTERNATIVE_REPO_NAME",
            static_conf.alternative_repo_name,
        ),
        mode,
    };

    let repo = Repo {
        owner: var("DRONE_REPO_OWNER"),
        name: var("DRONE_REPO_NAME"),
        link: var("DRONE_REPO_LINK"),
        avatar: var("DRONE_REPO_AVATAR"),
        branch: var("DRONE_REPO_BRANCH"),
        private: parse_flag(&var("DRONE_REPO_PRIVATE")),
        trusted: parse_flag(&var("DRONE_REPO_TRUSTED")),
        full_name: var("DRONE_REPO"),
    };

    let build = Build {
        number: parse_number(&lookup, "DRONE_BUILD_NUMBER")?,
        event: var("DRONE_BUILD_EVENT"),
        status: var("DRONE_BUILD_STATUS"),
        deploy: var("DRONE_DEPLOY_TO"),
        created: parse_number(&lookup, "DRONE_BUILD_CREATED")?,
        started: parse_number(&lookup, "DRONE_BUILD_STARTED")?,
        finished: parse_number(&lookup, "DRONE_BUILD_FINISHED")?,
        link: var("DRONE_BUILD_LINK"),
        tag: var("DRONE_TAG"),
    };

    let commit = Commit {
        remote: var("DRONE_REMOTE_URL"),
        sha: var("DRONE_COMMIT_SHA"),
        reference: var("DRONE_COMMIT_REF"),
        link: var("DRONE_COMMIT_LINK"),
        pull: var("DRONE_PULL_REQUEST"),
        branch: var("DRONE_COMMIT_BRANCH"),
        message: var("DRONE_COMMIT_MESSAGE"),
        author: Author {
            name: var("DRONE_COMMIT_AUTHOR"),
            email: var("DRONE_COMMIT_AUTHOR_EMAIL"),
            avatar: var("DRONE_COMMIT_AUTHOR_AVATAR"),
        },
    };

    let plugin = Plugin {
        repo,
        build,
        commit,
        settings,
    };
    plugin.trace_loaded();
    Ok(plugin)
}

fn read_static_config(path: &Path) -> Result<StaticConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = fs::read_to_string(path).with_context(|| {
        error!(config_path = ?path, "Failed to read config file");
        format!("Failed to read config file {path:?}")
    })?;

    if content.trim().is_empty() {
        info!(config_path = ?path, "Config file is empty, using defaults");
        return Ok(StaticConfig::default());
    }

    let conf: StaticConfig = serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML {path:?}: {e}")
    })?;
    info!(config_path = ?path, assets = conf.assets.len(), "Parsed config YAML successfully");
    Ok(conf)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_number<T, F>(lookup: &F, key: &str) -> Result<T>
where
    T: FromStr + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|e| {
            error!(error = %e, var = key, raw = %raw, "Variable must be a valid integer");
            anyhow::anyhow!("{key} must be a valid integer: {e}")
        }),
        _ => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_and_drops_blanks() {
        assert_eq!(
            split_list(" dist/*.tar.gz, ,checksums.txt ,"),
            vec!["dist/*.tar.gz".to_string(), "checksums.txt".to_string()]
        );
    }

    #[test]
    fn parse_flag_accepts_common_truthy_values() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("false"));
    }
}
