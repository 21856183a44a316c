//! gitlab-release: CI step that publishes a tagged GitLab release with uploaded assets.

pub mod assets;
pub mod cli;
pub mod config;
pub mod gitlab;
pub mod host;
pub mod links;
pub mod load_config;
pub mod release;
pub mod template;

pub use cli::{run, Cli, Commands};
