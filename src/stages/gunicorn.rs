//! Gunicorn systemd units

use crate::context::DeployContext;
use crate::error::{DeploymentError, Result};
use crate::runner::ExecOptions;
use crate::stages::python::gunicorn_path;
use crate::template::{Placeholders, Template};
use resumable::StageResult;

/// User the service runs as: configured, else `$USER`, else `id -un`
pub fn service_user(ctx: &DeployContext) -> Result<String> {
    if let Some(user) = &ctx.settings.service_user {
        return Ok(user.clone());
    }
    if let Some(user) = ctx.env.get("USER").filter(|u| !u.is_empty()) {
        return Ok(user);
    }

    let output = ctx.run_with(&["id", "-un"], &ExecOptions::default().capture())?;
    match output.stdout_trimmed() {
        "" => Err(DeploymentError::InvalidInput(
            "could not determine the current user".to_string(),
        )),
        user => Ok(user.to_string()),
    }
}

pub fn write_gunicorn_config_files(ctx: &mut DeployContext) -> StageResult {
    let gunicorn = gunicorn_path(ctx)?;
    let user = service_user(ctx)?;
    let project_path = ctx.layout.project_dir().to_string_lossy().into_owned();
    let templates_dir = ctx.settings.templates_dir.as_deref();

    let substitutions = [
        (Placeholders::USER, user.as_str()),
        (Placeholders::GROUP, ctx.settings.service_group.as_str()),
        (Placeholders::APP_NAME, ctx.layout.project_name.as_str()),
        (Placeholders::PROJECT_PATH, project_path.as_str()),
        (Placeholders::GUNICORN_PATH, gunicorn.as_str()),
    ];

    for template in [Template::GunicornSocket, Template::GunicornService] {
        let content = template.render(templates_dir, &substitutions)?;
        let dest = ctx.settings.systemd_dir.join(template.file_name());
        log::info!("Writing {}", dest.display());
        ctx.install_file(&content, &dest)?;
    }

    Ok(())
}
