//! Django management command stages

use crate::context::DeployContext;
use crate::environment;
use crate::runner::ExecOptions;
use resumable::{StageFailure, StageResult};

/// Merge `<project_dir>/.env` into the overlay before running manage.py
fn load_project_env(ctx: &mut DeployContext) -> StageResult {
    let path = ctx.layout.project_dir().join(".env");
    environment::load_dotenv(&mut ctx.env, &path).map_err(StageFailure::deployment)?;
    Ok(())
}

fn manage(ctx: &mut DeployContext, python: &str, args: &[&str]) -> StageResult {
    ctx.activate()?;
    load_project_env(ctx)?;

    let manage_py = ctx.layout.manage_py().to_string_lossy().into_owned();
    let mut argv = vec![python, manage_py.as_str()];
    argv.extend_from_slice(args);

    let opts = ExecOptions::default().in_dir(ctx.layout.project_dir());
    ctx.run_with(&argv, &opts)?;
    Ok(())
}

pub fn migrate_database(ctx: &mut DeployContext) -> StageResult {
    log::info!("Migrating database");
    manage(ctx, "python", &["migrate"])?;
    log::info!("Database migrated");
    Ok(())
}

pub fn collect_static(ctx: &mut DeployContext) -> StageResult {
    log::info!("Collecting static files");
    manage(ctx, "python3", &["collectstatic", "--no-input"])?;
    log::info!("Static files collected");
    Ok(())
}
