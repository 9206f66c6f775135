//! Help page shown for non-forwarding requests.

use askama::Template;

use crate::config::HelpConfig;
use crate::http::origin::PublicOrigin;

#[derive(Template)]
#[template(path = "help.html")]
struct HelpPage<'a> {
    title: &'a str,
    origin: &'a str,
    deploy_url: &'a str,
    repository_url: &'a str,
    total_requests: u64,
}

/// Render the usage page for `origin`. All dynamic values are HTML-escaped.
pub fn render_help(
    config: &HelpConfig,
    origin: &PublicOrigin,
    total_requests: u64,
) -> Result<String, askama::Error> {
    let origin = origin.as_origin();
    HelpPage {
        title: &config.title,
        origin: &origin,
        deploy_url: &config.deploy_url,
        repository_url: &config.repository_url,
        total_requests,
    }
    .render()
}
