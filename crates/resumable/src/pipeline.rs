//! Fixed, ordered pipelines of stages
//!
//! A pipeline owns the order of its stages. Each stage is dispatched
//! through [`runner::run`](crate::runner::run) with a shared ledger and
//! target key; the first failure ends the run.

use crate::error::Result;
use crate::ledger::Ledger;
use crate::observer::{NoObserver, StageObserver};
use crate::runner;
use crate::stage::{Stage, StageResult};
use crate::types::{RunSummary, StageOutcome};

/// An ordered list of stages sharing a context type `C`
pub struct Pipeline<C> {
    stages: Vec<Stage<C>>,
}

impl<C> Pipeline<C> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage
    ///
    /// Stage names are ledger keys and must be unique within a pipeline.
    pub fn push(&mut self, stage: Stage<C>) {
        debug_assert!(
            self.stages.iter().all(|s| s.name() != stage.name()),
            "duplicate stage name: {}",
            stage.name()
        );
        self.stages.push(stage);
    }

    /// Append a required, recorded stage
    pub fn stage(
        mut self,
        name: &'static str,
        body: impl Fn(&mut C) -> StageResult + 'static,
    ) -> Self {
        self.push(Stage::new(name, body));
        self
    }

    /// Append a recorded stage that only runs when `enabled`
    pub fn optional(
        mut self,
        name: &'static str,
        enabled: bool,
        body: impl Fn(&mut C) -> StageResult + 'static,
    ) -> Self {
        self.push(Stage::new(name, body).gated(enabled));
        self
    }

    /// Append a stage that runs on every invocation and is never recorded
    pub fn every_run(
        mut self,
        name: &'static str,
        body: impl Fn(&mut C) -> StageResult + 'static,
    ) -> Self {
        self.push(Stage::new(name, body).every_run());
        self
    }

    pub fn stages(&self) -> &[Stage<C>] {
        &self.stages
    }

    /// Stage names in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order for `target`
    pub fn run(&self, ledger: &mut Ledger, target: &str, ctx: &mut C) -> Result<RunSummary> {
        self.run_with(ledger, target, ctx, &mut NoObserver)
    }

    /// Run every stage in order, reporting progress to `observer`
    ///
    /// Stops at the first stage that fails; stages after it are not
    /// started. Completed stages are already durable in the ledger, so a
    /// later invocation resumes at the failed stage.
    pub fn run_with<O: StageObserver>(
        &self,
        ledger: &mut Ledger,
        target: &str,
        ctx: &mut C,
        observer: &mut O,
    ) -> Result<RunSummary> {
        let total = self.stages.len();
        let mut summary = RunSummary::default();
        observer.on_pipeline_start(total);

        for (i, stage) in self.stages.iter().enumerate() {
            observer.on_stage_start(i + 1, total, stage.name());

            let outcome = if stage.gate().allows() {
                runner::run(ledger, target, stage.name(), stage.tracking(), || {
                    stage.call(ctx)
                })?
            } else {
                log::info!("Stage {} disabled for this run", stage.name());
                StageOutcome::Disabled
            };

            observer.on_stage_finish(stage.name(), &outcome);
            summary.add(stage.name(), outcome);
        }

        Ok(summary)
    }
}

impl<C> Default for Pipeline<C> {
    fn default() -> Self {
        Self::new()
    }
}
