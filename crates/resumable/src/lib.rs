//! # Resumable
//!
//! Staged idempotent execution for long, failure-prone provisioning runs.
//!
//! ## Core Concepts
//!
//! - **Stage**: a named unit of work with a success/failure outcome
//! - **Ledger**: a durable JSON record of which stages completed, per target
//! - **Runner**: skips completed stages, records successful ones, and stops
//!   the run on the first failure
//! - **Pipeline**: a fixed, ordered list of stages run against one target
//!
//! A stage is recorded complete only after its body returns successfully,
//! so a crash or failure mid-stage leaves it unrecorded and it runs again
//! in full on the next invocation. Stage bodies must tolerate that.
//!
//! ## Example
//!
//! ```no_run
//! use resumable::{Ledger, Pipeline, StageFailure};
//! use std::path::Path;
//!
//! struct Ctx { packages: Vec<String> }
//!
//! let pipeline = Pipeline::new()
//!     .stage("update_system", |_ctx: &mut Ctx| Ok(()))
//!     .stage("install_packages", |ctx: &mut Ctx| {
//!         if ctx.packages.is_empty() {
//!             return Err(StageFailure::deployment(anyhow::anyhow!("nothing to install")));
//!         }
//!         Ok(())
//!     });
//!
//! let mut ledger = Ledger::load(Path::new("/srv/app")).unwrap();
//! let mut ctx = Ctx { packages: vec!["nginx".into()] };
//! pipeline.run(&mut ledger, "site", &mut ctx).unwrap();
//! ```

pub mod error;
pub mod ledger;
pub mod observer;
pub mod pipeline;
pub mod runner;
pub mod stage;
pub mod types;

pub use error::{Error, Result};
pub use ledger::{ARTIFACTS_DIR, LEDGER_FILE, Ledger};
pub use observer::{NoObserver, StageObserver};
pub use pipeline::Pipeline;
pub use stage::{Stage, StageBody, StageFailure, StageResult};
pub use types::{Gate, RunSummary, StageOutcome, Tracking};
