use crate::cli::GateArgs;
use crate::{stages, ui};
use anyhow::Result;
use colored::Colorize;
use resumable::{Gate, Tracking};

use super::status::options_for;

pub fn run(gates: &GateArgs) -> Result<()> {
    let pipeline = stages::pipeline(&options_for(gates));

    ui::header("Deployment Stages");
    for (i, stage) in pipeline.stages().iter().enumerate() {
        let note = match (stage.gate(), stage.tracking()) {
            (_, Tracking::EveryRun) => "every run".dimmed(),
            (Gate::Required, Tracking::Recorded) => "".normal(),
            (Gate::Optional { enabled: true }, _) => "enabled".green(),
            (Gate::Optional { enabled: false }, _) => "disabled".yellow(),
        };
        println!("  {:>2}. {:<36} {}", i + 1, stage.name(), note);
    }
    println!();
    ui::dim(&format!("{} in total", ui::count(pipeline.len(), "stage")));
    Ok(())
}
