//! # GitLab client
//!
//! Bridges the [`ReleaseHost`] trait to the GitLab REST API (v4) with `reqwest`.
//!
//! - Construct [`GitLabClient`] from the host root URL and a personal/project access token.
//! - The token travels in the `PRIVATE-TOKEN` header and is never logged.
//! - Project ids are the URL-encoded `group/project` path.

use crate::host::{
    AssetLink, HostError, NewRelease, ProjectFile, Release, ReleaseHost, ReleaseUpdate,
};
use async_trait::async_trait;
use reqwest::{multipart, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use url::Url;

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

pub struct GitLabClient {
    http: reqwest::Client,
    api_root: Url,
    token: String,
}

impl GitLabClient {
    /// `base` is the host root, e.g. `https://gitlab.com/`; `/api/v4` is appended.
    pub fn new(base: &Url, token: impl Into<String>) -> Result<Self, HostError> {
        let api_root = base
            .join("api/v4")
            .map_err(|e| HostError::Url(format!("{base}: {e}")))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| HostError::Transport {
                url: api_root.to_string(),
                source,
            })?;
        tracing::info!(api_root = %api_root, "Initialized GitLab client");
        Ok(GitLabClient {
            http,
            api_root,
            token: token.into(),
        })
    }

    fn project_url(&self, project: &str, rest: &[&str]) -> Result<Url, HostError> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|_| HostError::Url(self.api_root.to_string()))?
            .pop_if_empty()
            .push("projects")
            .push(project)
            .extend(rest);
        Ok(url)
    }

    fn request(&self, method: Method, url: &Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url.clone())
            .header(TOKEN_HEADER, &self.token)
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, HostError> {
        tracing::debug!(%method, %url, "Sending request");
        let response = builder.send().await.map_err(|source| HostError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!(%method, %url, status = status.as_u16(), "Request rejected by host");
        Err(HostError::Status {
            method: method.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn json<T: DeserializeOwned>(
        url: &Url,
        response: reqwest::Response,
    ) -> Result<T, HostError> {
        response.json::<T>().await.map_err(|source| HostError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ReleaseHost for GitLabClient {
    async fn upload_file(&self, project: &str, path: &Path) -> Result<ProjectFile, HostError> {
        let io_error = |source| HostError::Io {
            path: path.display().to_string(),
            source,
        };
        let file = tokio::fs::File::open(path).await.map_err(io_error)?;
        let size = file.metadata().await.map_err(io_error)?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "asset".to_string());
        tracing::info!(project, file = %file_name, size, "Uploading project file");

        let url = self.project_url(project, &["uploads"])?;
        let part = multipart::Part::stream_with_length(file, size).file_name(file_name);
        let form = multipart::Form::new().part("file", part);
        let builder = self.request(Method::POST, &url).multipart(form);
        let response = self.send(Method::POST, &url, builder).await?;
        Self::json(&url, response).await
    }

    async fn get_release(&self, project: &str, tag: &str) -> Result<Option<Release>, HostError> {
        let url = self.project_url(project, &["releases", tag])?;
        let builder = self.request(Method::GET, &url);
        let response = builder.send().await.map_err(|source| HostError::Transport {
            url: url.to_string(),
            source,
        })?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!(project, tag, "No existing release for tag");
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HostError::Status {
                method: Method::GET.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Self::json(&url, response).await.map(Some)
    }

    async fn delete_release(&self, project: &str, tag: &str) -> Result<(), HostError> {
        let url = self.project_url(project, &["releases", tag])?;
        let builder = self.request(Method::DELETE, &url);
        self.send(Method::DELETE, &url, builder).await?;
        tracing::info!(project, tag, "Deleted release");
        Ok(())
    }

    async fn create_release(
        &self,
        project: &str,
        release: NewRelease,
    ) -> Result<Release, HostError> {
        let url = self.project_url(project, &["releases"])?;
        let builder = self.request(Method::POST, &url).json(&release);
        let response = self.send(Method::POST, &url, builder).await?;
        Self::json(&url, response).await
    }

    async fn update_release(
        &self,
        project: &str,
        tag: &str,
        update: ReleaseUpdate,
    ) -> Result<Release, HostError> {
        let url = self.project_url(project, &["releases", tag])?;
        let builder = self.request(Method::PUT, &url).json(&update);
        let response = self.send(Method::PUT, &url, builder).await?;
        Self::json(&url, response).await
    }

    async fn create_asset_link(
        &self,
        project: &str,
        tag: &str,
        link: AssetLink,
    ) -> Result<AssetLink, HostError> {
        let url = self.project_url(project, &["releases", tag, "assets", "links"])?;
        let builder = self.request(Method::POST, &url).json(&link);
        let response = self.send(Method::POST, &url, builder).await?;
        Self::json(&url, response).await
    }

    async fn delete_asset_link(
        &self,
        project: &str,
        tag: &str,
        link_id: u64,
    ) -> Result<(), HostError> {
        let id = link_id.to_string();
        let url = self.project_url(project, &["releases", tag, "assets", "links", &id])?;
        let builder = self.request(Method::DELETE, &url);
        self.send(Method::DELETE, &url, builder).await?;
        tracing::info!(project, tag, link_id, "Deleted release link");
        Ok(())
    }
}
