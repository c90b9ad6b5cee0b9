//! Uniform logging wrapper around workflow steps.
//!
//! A step is handed to [`StepRunner::run`] as a closure that either fails
//! straight away (a precondition was not met) or returns the pending platform
//! operation. The runner logs `start` before calling the closure and exactly
//! one terminal entry afterwards. Failures never escape the runner: they are
//! logged and reported back as a [`StepOutcome`].

use futures::future::BoxFuture;
use tracing::{info, warn};

use crate::error::Result;
use crate::log::{ActivityLog, LogTag};

/// The pending part of a step.
pub type StepFuture<'a> = BoxFuture<'a, Result<()>>;

/// Where a failed step stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// The step failed before any platform call was made.
    Construction,
    /// The platform call was made and rejected, or its result could not be used.
    Completion,
}

/// Result of running a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed { stage: FailureStage, message: String },
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }

    /// Failure message, if the step failed.
    pub fn message(&self) -> Option<&str> {
        match self {
            StepOutcome::Succeeded => None,
            StepOutcome::Failed { message, .. } => Some(message),
        }
    }
}

/// Runs steps and records their lifecycle in an [`ActivityLog`].
#[derive(Debug, Clone, Default)]
pub struct StepRunner {
    log: ActivityLog,
}

impl StepRunner {
    pub fn new(log: ActivityLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    /// Run one step under `name`.
    ///
    /// No retry and no timeout are applied here; timeouts belong to the
    /// platform implementation.
    pub async fn run<'a, F>(&self, name: &str, operation: F) -> StepOutcome
    where
        F: FnOnce() -> Result<StepFuture<'a>>,
    {
        self.log.append(LogTag::Start, name, None);
        info!(step = name, "step started");

        let pending = match operation() {
            Ok(pending) => pending,
            Err(e) => return self.fail(name, FailureStage::Construction, e.to_string()),
        };

        match pending.await {
            Ok(()) => {
                self.log.append(LogTag::Success, name, None);
                info!(step = name, "step succeeded");
                StepOutcome::Succeeded
            }
            Err(e) => self.fail(name, FailureStage::Completion, e.to_string()),
        }
    }

    fn fail(&self, name: &str, stage: FailureStage, message: String) -> StepOutcome {
        self.log.append(LogTag::Error, name, Some(message.clone()));
        warn!(step = name, ?stage, "step failed: {}", message);
        StepOutcome::Failed { stage, message }
    }
}
