//! Progress observation for pipeline runs
//!
//! Lets a front-end show progress without the engine depending on any
//! particular terminal UI.

use crate::types::StageOutcome;

/// Receives progress updates while a pipeline runs
pub trait StageObserver {
    /// Called once before the first stage
    fn on_pipeline_start(&mut self, _total: usize) {}

    /// Called before each stage is considered (1-based `index`)
    fn on_stage_start(&mut self, index: usize, total: usize, name: &str);

    /// Called after a stage finished without failing
    fn on_stage_finish(&mut self, name: &str, outcome: &StageOutcome);
}

/// No-op observer
pub struct NoObserver;

impl StageObserver for NoObserver {
    fn on_stage_start(&mut self, _index: usize, _total: usize, _name: &str) {}
    fn on_stage_finish(&mut self, _name: &str, _outcome: &StageOutcome) {}
}
