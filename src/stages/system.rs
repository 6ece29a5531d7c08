//! OS package stages

use crate::context::DeployContext;
use resumable::StageResult;

pub fn update_system(ctx: &mut DeployContext) -> StageResult {
    log::info!("Updating system");
    ctx.run_elevated(&["apt", "update", "-y"])?;
    log::info!("System updated");
    Ok(())
}

pub fn install_apt_packages(ctx: &mut DeployContext) -> StageResult {
    let packages = &ctx.settings.apt_packages;
    if packages.is_empty() {
        log::warn!("No apt packages configured");
        return Ok(());
    }

    let mut argv = vec!["apt", "install", "-y"];
    argv.extend(packages.iter().map(String::as_str));
    ctx.run_elevated(&argv)?;

    log::info!("{} apt packages installed", packages.len());
    Ok(())
}
