//! Service restart, run on every deploy

use crate::context::DeployContext;
use resumable::StageResult;

/// Reload units and restart gunicorn and nginx
pub fn restart_services(ctx: &mut DeployContext) -> StageResult {
    ctx.run_elevated(&["systemctl", "daemon-reload"])?;
    log::info!("Daemon reloaded");

    for service in ["gunicorn", "nginx"] {
        ctx.run_elevated(&["systemctl", "restart", service])?;
        log::info!("{service} restarted");
    }
    Ok(())
}
