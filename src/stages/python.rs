//! Virtualenv and Python package stages

use crate::context::DeployContext;
use crate::error::{self, DeploymentError};
use crate::runner::ExecOptions;
use resumable::StageResult;
use std::path::PathBuf;

/// Create the virtualenv if needed, activate it and upgrade its pip
pub fn install_create_activate_virtualenv(ctx: &mut DeployContext) -> StageResult {
    let venv = ctx.layout.venv_dir();

    if ctx.layout.activate_script().exists() {
        log::info!("Virtualenv already exists at {}", venv.display());
    } else {
        log::info!("Creating virtualenv at {}", venv.display());
        let venv_arg = venv.to_string_lossy().into_owned();
        ctx.run(&["python3", "-m", "venv", venv_arg.as_str()])?;
    }

    ctx.activate()?;
    ctx.run(&["pip3", "install", "--upgrade", "pip"])?;
    log::info!("Virtualenv ready");
    Ok(())
}

/// First configured requirements file that exists in the project
pub fn find_requirements(ctx: &DeployContext) -> Option<PathBuf> {
    let project = ctx.layout.project_dir();
    ctx.settings
        .requirements_files
        .iter()
        .map(|name| project.join(name))
        .find(|path| path.is_file())
}

pub fn install_project_dependencies(ctx: &mut DeployContext) -> StageResult {
    ctx.activate()?;

    let Some(requirements) = find_requirements(ctx) else {
        log::warn!(
            "No requirements file found (tried {})",
            ctx.settings.requirements_files.join(", ")
        );
        return Ok(());
    };

    log::info!("Installing dependencies from {}", requirements.display());
    let requirements_arg = requirements.to_string_lossy().into_owned();
    ctx.run(&["pip3", "install", "-r", requirements_arg.as_str()])?;
    Ok(())
}

pub fn install_gunicorn(ctx: &mut DeployContext) -> StageResult {
    ctx.activate()?;
    ctx.run(&["pip3", "install", "gunicorn"])?;
    log::info!("Gunicorn installed");
    Ok(())
}

/// Absolute path of the gunicorn binary as the activated environment sees it
pub fn gunicorn_path(ctx: &mut DeployContext) -> error::Result<String> {
    ctx.activate()?;
    let output = ctx.run_with(&["which", "gunicorn"], &ExecOptions::default().capture())?;

    let path = output.stdout_trimmed();
    if path.is_empty() {
        return Err(DeploymentError::InvalidInput(
            "`which gunicorn` printed nothing".to_string(),
        ));
    }
    log::info!("Gunicorn path: {path}");
    Ok(path.to_string())
}
