//! Scheduler-facing step phases.

use serde::{Deserialize, Serialize};

/// Discriminates how a terminate request ended the step.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TerminateOutcome {
    /// No terminate request was recorded.
    #[default]
    None,
    /// Plain termination; the workflow stops successfully.
    Terminated,
    /// Termination with failure.
    Failed,
}

/// Final status of a terminated step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TerminationStatus {
    Succeeded,
    Failed,
}

/// Phase a step lands in after an operation call.
///
/// `Running` is the only initial phase. The remaining phases are terminal for
/// the step; the scheduler decides whether `Waiting` is retried on a later tick.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepPhase {
    #[default]
    Running,
    Waiting,
    Suspended,
    Terminated(TerminationStatus),
}

impl StepPhase {
    /// Returns true when the phase ends the step.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepPhase::Running)
    }
}

impl std::fmt::Display for StepPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepPhase::Running => write!(f, "running"),
            StepPhase::Waiting => write!(f, "waiting"),
            StepPhase::Suspended => write!(f, "suspended"),
            StepPhase::Terminated(TerminationStatus::Succeeded) => write!(f, "terminated (succeeded)"),
            StepPhase::Terminated(TerminationStatus::Failed) => write!(f, "terminated (failed)"),
        }
    }
}
