use crate::cli::{GateArgs, StatusArgs};
use crate::context::{DeployOptions, validate_project_name};
use crate::{paths, stages, ui};
use anyhow::Result;
use colored::Colorize;
use resumable::{Ledger, Tracking};

pub fn run(args: StatusArgs) -> Result<()> {
    let root = paths::expand(&args.root_path);
    let path = Ledger::path_for(&root);

    // never create a ledger just to report on it
    if !path.exists() {
        ui::info(&format!("No stage ledger at {}", path.display()));
        return Ok(());
    }
    let ledger = Ledger::load(&root)?;

    let targets: Vec<String> = match args.project_name {
        Some(name) => {
            validate_project_name(&name)?;
            vec![name]
        }
        None => ledger.targets().map(str::to_string).collect(),
    };

    ui::header("Deployment Status");
    ui::kv("Ledger", &path.display().to_string());

    if targets.is_empty() {
        ui::dim("No deployments recorded");
        return Ok(());
    }

    let pipeline = stages::pipeline(&DeployOptions::default());
    let known = pipeline.names();
    for target in &targets {
        ui::section(target);

        let mut done = 0;
        let mut recorded = 0;
        for stage in pipeline.stages() {
            if stage.tracking() == Tracking::EveryRun {
                println!("  {} {}", "↻".dimmed(), stage.name().dimmed());
                continue;
            }
            recorded += 1;
            if ledger.is_complete(target, stage.name()) {
                done += 1;
                println!("  {} {}", "✓".green(), stage.name());
            } else {
                println!("  {} {}", "·".dimmed(), stage.name());
            }
        }

        let unknown: Vec<&str> = ledger
            .completed(target)
            .into_iter()
            .filter(|name| known.iter().all(|k| k != name))
            .collect();
        if !unknown.is_empty() {
            ui::dim(&format!("also recorded: {}", unknown.join(", ")));
        }
        ui::kv("Progress", &format!("{done}/{recorded}"));
    }

    Ok(())
}

/// The gates `stages` displays for a given flag set
pub(crate) fn options_for(gates: &GateArgs) -> DeployOptions {
    DeployOptions {
        migrate: gates.migrate,
        collectstatic: !gates.no_collectstatic,
        ..DeployOptions::default()
    }
}
