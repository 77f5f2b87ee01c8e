//! Step action protocol.
//!
//! Operations report control-flow outcomes through an [`ActionController`]
//! handed to them per call. The controller only ever raises flags; resetting
//! between steps is done by creating a fresh [`ActionRecorder`].

use serde::{Deserialize, Serialize};
use stepcore_types::{StepPhase, TerminateOutcome, TerminationStatus};

/// Capability through which a step operation signals the scheduler.
///
/// `suspend`, `wait` and `message` keep the previous message when given an
/// empty one. `terminate` and `fail` always overwrite it, even with an empty
/// string.
pub trait ActionController {
    fn suspend(&mut self, message: &str);
    fn wait(&mut self, message: &str);
    /// Ends the workflow with outcome `Terminated`. Outcomes only escalate: a
    /// `fail` earlier in the same call keeps the outcome `Failed`, unlike a
    /// plain overwrite.
    fn terminate(&mut self, message: &str);
    fn fail(&mut self, message: &str);
    fn message(&mut self, message: &str);
}

/// Signals accumulated during one step call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionState {
    pub suspend: bool,
    pub wait: bool,
    pub terminate: bool,
    pub outcome: TerminateOutcome,
    pub message: String,
}

impl ActionState {
    /// Classifies the flags. Terminate wins over suspend, which wins over wait.
    pub fn phase(&self) -> StepPhase {
        if self.terminate {
            return match self.outcome {
                TerminateOutcome::Failed => StepPhase::Terminated(TerminationStatus::Failed),
                TerminateOutcome::Terminated | TerminateOutcome::None => StepPhase::Terminated(TerminationStatus::Succeeded),
            };
        }
        if self.suspend {
            return StepPhase::Suspended;
        }
        if self.wait {
            return StepPhase::Waiting;
        }
        StepPhase::Running
    }
}

/// In-memory controller recording every signal into an [`ActionState`].
#[derive(Debug, Clone, Default)]
pub struct ActionRecorder {
    state: ActionState,
}

impl ActionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ActionState {
        &self.state
    }

    pub fn into_state(self) -> ActionState {
        self.state
    }

    fn note(&mut self, message: &str) {
        if !message.is_empty() {
            self.state.message = message.to_string();
        }
    }
}

impl ActionController for ActionRecorder {
    fn suspend(&mut self, message: &str) {
        self.state.suspend = true;
        self.note(message);
    }

    fn wait(&mut self, message: &str) {
        self.state.wait = true;
        self.note(message);
    }

    fn terminate(&mut self, message: &str) {
        self.state.terminate = true;
        // a failure recorded earlier in the same call stays a failure
        if self.state.outcome != TerminateOutcome::Failed {
            self.state.outcome = TerminateOutcome::Terminated;
        }
        self.state.message = message.to_string();
    }

    fn fail(&mut self, message: &str) {
        self.state.terminate = true;
        self.state.outcome = TerminateOutcome::Failed;
        self.state.message = message.to_string();
    }

    fn message(&mut self, message: &str) {
        self.note(message);
    }
}
