//! Core types for staged execution

use std::fmt;

/// Whether a stage only runs while enabled by a run-time flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Always part of the run
    Required,
    /// Part of the run only when `enabled`
    Optional { enabled: bool },
}

impl Gate {
    /// Check if the stage should run on this invocation
    pub fn allows(&self) -> bool {
        match self {
            Self::Required => true,
            Self::Optional { enabled } => *enabled,
        }
    }
}

/// How a stage interacts with the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracking {
    /// Skipped when recorded complete, recorded after success
    Recorded,
    /// Runs on every invocation and is never recorded
    EveryRun,
}

/// What happened to one stage during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The body ran and returned successfully
    Executed,
    /// Already recorded complete; the body was not invoked
    Skipped,
    /// Turned off by its gate for this run
    Disabled,
}

impl StageOutcome {
    /// Check if the stage body was invoked
    pub fn ran(&self) -> bool {
        matches!(self, Self::Executed)
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executed => write!(f, "done"),
            Self::Skipped => write!(f, "already completed"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

/// Per-stage outcomes of a completed run, in pipeline order
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(String, StageOutcome)>,
}

impl RunSummary {
    /// Add a stage outcome to the summary
    pub fn add(&mut self, stage: &str, outcome: StageOutcome) {
        self.outcomes.push((stage.to_string(), outcome));
    }

    /// Outcome recorded for `stage`
    pub fn outcome(&self, stage: &str) -> Option<&StageOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, outcome)| outcome)
    }

    pub fn executed(&self) -> usize {
        self.count(&StageOutcome::Executed)
    }

    pub fn skipped(&self) -> usize {
        self.count(&StageOutcome::Skipped)
    }

    pub fn disabled(&self) -> usize {
        self.count(&StageOutcome::Disabled)
    }

    fn count(&self, wanted: &StageOutcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| o == wanted).count()
    }
}
