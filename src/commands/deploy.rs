use crate::cli::DeployArgs;
use crate::config::Settings;
use crate::context::{DeployContext, DeployOptions};
use crate::runner::Executor;
use crate::{stages, sudo, ui};
use anyhow::Result;
use resumable::{Ledger, StageObserver, StageOutcome};

use super::{elevation, require, resolve_layout};

/// Numbered progress lines for a pipeline run
pub struct UiObserver;

impl StageObserver for UiObserver {
    fn on_stage_start(&mut self, index: usize, total: usize, name: &str) {
        ui::step(index, total, name);
    }

    fn on_stage_finish(&mut self, name: &str, outcome: &StageOutcome) {
        match outcome {
            StageOutcome::Executed => ui::success(&format!("{name}: {outcome}")),
            StageOutcome::Skipped | StageOutcome::Disabled => ui::dim(&format!("{name}: {outcome}")),
        }
    }
}

pub fn run(args: DeployArgs) -> Result<()> {
    let settings = Settings::load()?;
    let layout = resolve_layout(&args.target)?;
    let repo_url = require(args.git_repo, "Git repo", "--git-repo")?;

    let options = DeployOptions {
        repo_url,
        branch: args.git_branch.unwrap_or_else(|| settings.branch.clone()),
        domain: args.domain_name,
        migrate: args.gates.migrate,
        collectstatic: !args.gates.no_collectstatic,
    };
    let exec = Executor::system(elevation(args.no_sudo, &settings));

    ui::banner();
    ui::header(&format!("Deploying {}", layout.project_name));
    ui::kv("Root", &layout.root.display().to_string());
    ui::kv("Project dir", &layout.project_dir().display().to_string());
    ui::kv("Repository", &format!("{} ({})", options.repo_url, options.branch));
    ui::kv("Domain", options.domain.as_deref().unwrap_or("public IP"));

    if !exec.elevation().is_enabled() {
        ui::warn("Elevation disabled: privileged commands run as the current user");
    }

    let mut ctx = DeployContext::new(settings, layout, options, exec);
    sudo::preflight(
        &ctx.exec,
        &ctx.env,
        "installing packages and writing systemd/nginx configuration",
    )?;

    let mut ledger = Ledger::load(&ctx.layout.root)?;
    log::info!("Stage ledger: {}", ledger.path().display());

    let pipeline = stages::pipeline(&ctx.options);
    let target = ctx.layout.project_name.clone();

    println!();
    let summary = pipeline.run_with(&mut ledger, &target, &mut ctx, &mut UiObserver)?;

    println!();
    ui::success(&format!(
        "Deployed {target}: {} run, {} already completed, {} disabled",
        ui::count(summary.executed(), "stage"),
        summary.skipped(),
        summary.disabled()
    ));
    Ok(())
}
