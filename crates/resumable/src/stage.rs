//! Stage definitions and the failure classification stage bodies report

use crate::types::{Gate, Tracking};
use std::fmt;

/// Failure returned by a stage body
///
/// `Deployment` is an expected provisioning failure (a command exited
/// non-zero, a file could not be written, activation did not take). It
/// stops the pipeline and is reported as such. `Defect` is anything else
/// and is propagated without being folded into the deployment category.
#[derive(Debug)]
pub enum StageFailure {
    Deployment(anyhow::Error),
    Defect(anyhow::Error),
}

impl StageFailure {
    /// Classify an error as an expected deployment failure
    pub fn deployment(err: impl Into<anyhow::Error>) -> Self {
        Self::Deployment(err.into())
    }

    /// Check if this is the expected, classified kind
    pub fn is_deployment(&self) -> bool {
        matches!(self, Self::Deployment(_))
    }

    pub fn into_inner(self) -> anyhow::Error {
        match self {
            Self::Deployment(e) | Self::Defect(e) => e,
        }
    }
}

/// Unclassified errors are defects unless a body says otherwise
impl From<anyhow::Error> for StageFailure {
    fn from(err: anyhow::Error) -> Self {
        Self::Defect(err)
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deployment(e) => write!(f, "{e:#}"),
            Self::Defect(e) => write!(f, "unexpected: {e:#}"),
        }
    }
}

/// Result of a stage body
pub type StageResult = std::result::Result<(), StageFailure>;

/// Boxed stage body, called with the pipeline's context
pub type StageBody<C> = Box<dyn Fn(&mut C) -> StageResult>;

/// A named unit of work in a pipeline
pub struct Stage<C> {
    name: &'static str,
    gate: Gate,
    tracking: Tracking,
    body: StageBody<C>,
}

impl<C> Stage<C> {
    /// Create a required, recorded stage
    pub fn new(name: &'static str, body: impl Fn(&mut C) -> StageResult + 'static) -> Self {
        Self {
            name,
            gate: Gate::Required,
            tracking: Tracking::Recorded,
            body: Box::new(body),
        }
    }

    /// Gate this stage on a run-time flag
    pub fn gated(mut self, enabled: bool) -> Self {
        self.gate = Gate::Optional { enabled };
        self
    }

    /// Run this stage on every invocation without recording it
    pub fn every_run(mut self) -> Self {
        self.tracking = Tracking::EveryRun;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn gate(&self) -> Gate {
        self.gate
    }

    pub fn tracking(&self) -> Tracking {
        self.tracking
    }

    /// Invoke the body directly, bypassing the ledger
    pub fn call(&self, ctx: &mut C) -> StageResult {
        (self.body)(ctx)
    }
}

impl<C> fmt::Debug for Stage<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("gate", &self.gate)
            .field("tracking", &self.tracking)
            .finish_non_exhaustive()
    }
}
