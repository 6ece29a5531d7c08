//! Reverse proxy site

use crate::context::DeployContext;
use crate::runner::ExecOptions;
use crate::template::{Placeholders, Template};
use resumable::StageResult;
use std::net::IpAddr;
use std::time::Duration;

const PUBLIC_IP_TIMEOUT: Duration = Duration::from_secs(5);

/// Ask `url` for this host's public address
///
/// Any failure (network, status, a body that is not an IP) yields `None`.
pub fn public_ip(url: &str) -> Option<String> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(PUBLIC_IP_TIMEOUT))
        .build()
        .into();

    let body = match agent
        .get(url)
        .header("User-Agent", "gantry")
        .call()
        .and_then(|mut response| response.body_mut().read_to_string())
    {
        Ok(body) => body,
        Err(e) => {
            log::warn!("Could not fetch public IP from {url}: {e}");
            return None;
        }
    };

    let candidate = body.trim();
    match candidate.parse::<IpAddr>() {
        Ok(ip) => Some(ip.to_string()),
        Err(_) => {
            log::warn!("Unexpected public IP response from {url}: {candidate:?}");
            None
        }
    }
}

/// Explicit domain, else the looked-up public IP, else `localhost`
pub fn resolve_domain(explicit: Option<&str>, lookup: impl FnOnce() -> Option<String>) -> String {
    if let Some(domain) = explicit.filter(|d| !d.trim().is_empty()) {
        return domain.trim().to_string();
    }
    lookup().unwrap_or_else(|| {
        log::warn!("Could not get public IP, using localhost instead");
        "localhost".to_string()
    })
}

pub fn setup_nginx(ctx: &mut DeployContext) -> StageResult {
    let url = ctx.settings.public_ip_url.clone();
    let domain = resolve_domain(ctx.options.domain.as_deref(), || public_ip(&url));
    log::info!("Setting up nginx for {domain}");

    let project_path = ctx.layout.project_dir().to_string_lossy().into_owned();
    let content = Template::Nginx.render(
        ctx.settings.templates_dir.as_deref(),
        &[
            (Placeholders::DOMAIN_NAME, domain.as_str()),
            (Placeholders::PROJECT_PATH, project_path.as_str()),
        ],
    )?;

    let site = ctx.settings.nginx_sites_available.join(&ctx.layout.project_name);
    ctx.install_file(&content, &site)?;

    // an existing link makes ln exit non-zero
    let site_arg = site.to_string_lossy().into_owned();
    let enabled_arg = ctx.settings.nginx_sites_enabled.to_string_lossy().into_owned();
    let linked = ctx.run_with(
        &["ln", "-s", site_arg.as_str(), enabled_arg.as_str()],
        &ExecOptions::elevated().lenient(),
    )?;
    if !linked.success() {
        log::info!("nginx site already enabled");
    }

    Ok(())
}
