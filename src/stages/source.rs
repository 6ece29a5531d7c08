//! Project checkout stages

use crate::context::DeployContext;
use crate::error::DeploymentError;
use crate::runner::ExecOptions;
use resumable::StageResult;
use std::fs;
use std::path::Path;

pub fn create_project_dir(ctx: &mut DeployContext) -> StageResult {
    let dir = ctx.layout.project_dir();
    log::info!("Creating project dir {}", dir.display());
    fs::create_dir_all(&dir).map_err(|source| DeploymentError::FileWrite {
        path: dir.clone(),
        source,
    })?;
    Ok(())
}

/// Clone the repository unless the destination already has content
///
/// A crash after `git clone` starts but before the stage is recorded
/// leaves a populated directory behind; cloning into it again would fail.
pub fn clone_git_repo(ctx: &mut DeployContext) -> StageResult {
    let dest = ctx.layout.project_dir();
    if has_entries(&dest) {
        log::info!("Git repo already cloned at {}", dest.display());
        return Ok(());
    }

    log::info!("Cloning {} into {}", ctx.options.repo_url, dest.display());
    let dest_arg = dest.to_string_lossy().into_owned();
    ctx.run(&[
        "git",
        "clone",
        "-b",
        ctx.options.branch.as_str(),
        ctx.options.repo_url.as_str(),
        dest_arg.as_str(),
    ])?;
    Ok(())
}

/// Best-effort `git pull`, run on every invocation
pub fn pull_latest_changes(ctx: &mut DeployContext) -> StageResult {
    let dir = ctx.layout.project_dir();
    log::info!("Pulling latest changes in {}", dir.display());

    if let Err(e) = ctx.run_with(&["git", "pull"], &ExecOptions::default().in_dir(&dir)) {
        log::warn!("Could not pull latest changes: {e}");
    }
    Ok(())
}

fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
