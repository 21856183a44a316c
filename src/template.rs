//! Release description rendering with Handlebars.

use crate::config::{is_blank, Build, Commit, Plugin, Repo};
use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_RELEASE_TEMPLATE: &str = "## Release Notes\n*Commit message*: {{commit.message}}";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Invalid release template: {0}")]
    Parse(#[from] handlebars::TemplateError),
    #[error("Failed to render release template: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Values reachable from a release template. Settings (and the token) are not exposed.
#[derive(Serialize)]
struct TemplateContext<'a> {
    repo: &'a Repo,
    build: &'a Build,
    commit: &'a Commit,
    release_name: String,
}

/// Renders the release description from the configured template, or the default one.
pub fn render_description(plugin: &Plugin) -> Result<String, TemplateError> {
    let template = if is_blank(&plugin.settings.release_template) {
        DEFAULT_RELEASE_TEMPLATE
    } else {
        plugin.settings.release_template.as_str()
    };

    let mut hb = Handlebars::new();
    hb.set_strict_mode(true);
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_template_string("release-message", template)?;

    let context = TemplateContext {
        repo: &plugin.repo,
        build: &plugin.build,
        commit: &plugin.commit,
        release_name: plugin.release_name(),
    };
    Ok(hb.render("release-message", &context)?)
}
