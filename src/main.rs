mod cli;
mod commands;
mod config;
mod context;
mod database;
mod environment;
mod error;
mod paths;
mod runner;
mod stages;
mod sudo;
mod template;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Command::Deploy(args) => commands::deploy::run(args),
        Command::Database(args) => commands::database::run(args),
        Command::Status(args) => commands::status::run(args),
        Command::Stages(gates) => commands::stages::run(&gates),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "gantry", &mut io::stdout());
            Ok(())
        }
    };

    // A failed stage is an expected outcome: report it and exit non-zero.
    // Anything else keeps its full chain through main's error return.
    if let Err(e) = &result
        && let Some(err) = e.downcast_ref::<resumable::Error>()
        && err.is_aborted()
    {
        ui::error(&format!("{err}"));
        ui::dim("Fix the problem and run the same command again to resume.");
        std::process::exit(1);
    }

    result
}
