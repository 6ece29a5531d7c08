pub mod database;
pub mod deploy;
pub mod stages;
pub mod status;

use crate::cli::TargetArgs;
use crate::config::Settings;
use crate::context::Layout;
use crate::paths;
use crate::sudo::Elevation;
use anyhow::{Context, Result, bail};
use dialoguer::Input;
use std::io::IsTerminal;

/// Use `value`, or ask for it when stdin is a terminal
pub(crate) fn require(value: Option<String>, prompt: &str, flag: &str) -> Result<String> {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        return Ok(value);
    }
    if !std::io::stdin().is_terminal() {
        bail!("{flag} is required");
    }

    Input::new()
        .with_prompt(prompt)
        .interact_text()
        .with_context(|| format!("Failed to read {flag}"))
}

/// Resolve the root and project, prompting for whatever is missing
pub(crate) fn resolve_layout(target: &TargetArgs) -> Result<Layout> {
    let root = require(target.root_path.clone(), "Root path", "--root-path")?;
    let project = require(target.project_name.clone(), "Project name", "--project-name")?;
    Ok(Layout::new(paths::expand(&root), &project)?)
}

/// Elevation policy from `--no-sudo` and the configured wrapper
pub(crate) fn elevation(no_sudo: bool, settings: &Settings) -> Elevation {
    if no_sudo || settings.elevation_program.is_empty() {
        Elevation::disabled()
    } else {
        Elevation::with_program(settings.elevation_program.clone())
    }
}
