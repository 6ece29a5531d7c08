//! Stage runner - applies skip, record and fail-fast around a stage body
//!
//! Stage bodies stay plain procedures. This is the one place that decides
//! whether a body runs at all, records its completion, and turns a
//! deployment failure into a pipeline abort.

use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::stage::StageFailure;
use crate::types::{StageOutcome, Tracking};

/// Run one stage body under the ledger's skip/record semantics
///
/// 1. A recorded stage already complete for `target` returns
///    [`StageOutcome::Skipped`] without invoking `body`.
/// 2. Otherwise `body` runs. On success a recorded stage is marked
///    complete (a blocking full-document write) before returning.
/// 3. A deployment failure is logged and returned as
///    [`Error::StageAborted`]; a defect is returned as
///    [`Error::StageDefect`] without being logged as a deployment failure.
///    Nothing is recorded in either case.
pub fn run<F>(
    ledger: &mut Ledger,
    target: &str,
    stage: &str,
    tracking: Tracking,
    body: F,
) -> Result<StageOutcome>
where
    F: FnOnce() -> std::result::Result<(), StageFailure>,
{
    if tracking == Tracking::Recorded && ledger.is_complete(target, stage) {
        log::info!("Stage {stage} already completed");
        return Ok(StageOutcome::Skipped);
    }

    log::debug!("Running stage {stage} for {target}");

    match body() {
        Ok(()) => {
            if tracking == Tracking::Recorded {
                ledger.mark_complete(target, stage)?;
            }
            Ok(StageOutcome::Executed)
        }
        Err(StageFailure::Deployment(source)) => {
            log::error!("Stage {stage} failed: {source:#}");
            Err(Error::StageAborted {
                stage: stage.to_string(),
                source,
            })
        }
        Err(StageFailure::Defect(source)) => Err(Error::StageDefect {
            stage: stage.to_string(),
            source,
        }),
    }
}
