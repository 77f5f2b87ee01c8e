//! Single-step driver.

use stepcore_types::StepPhase;
use tracing::{debug, info, warn};

use crate::action::{ActionRecorder, ActionState};
use crate::context::WorkflowContext;
use crate::document::Node;
use crate::error::StepError;
use crate::provider::ProviderRegistry;

/// Outcome of one operation call.
///
/// `state` holds every signal recorded before the call returned, including
/// when it returned an error. `phase` is derived from those signals only: an
/// error does not end the workflow by itself.
#[derive(Debug)]
pub struct StepReport {
    pub provider: String,
    pub operation: String,
    pub state: ActionState,
    pub phase: StepPhase,
    pub error: Option<StepError>,
}

impl StepReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn message(&self) -> &str {
        &self.state.message
    }
}

/// Runs one operation with a fresh action recorder.
pub fn run_step(
    registry: &ProviderRegistry,
    context: &mut WorkflowContext,
    provider: &str,
    operation: &str,
    input: Option<&mut Node>,
) -> StepReport {
    debug!(provider, operation, has_input = input.is_some(), "dispatching step operation");
    let mut recorder = ActionRecorder::new();
    let outcome = registry.invoke(provider, operation, context, input, &mut recorder);
    let state = recorder.into_state();
    let phase = state.phase();

    match &outcome {
        Ok(()) => info!(provider, operation, phase = %phase, "step operation finished"),
        Err(error) => warn!(provider, operation, phase = %phase, error = %error, "step operation failed"),
    }

    StepReport {
        provider: provider.to_string(),
        operation: operation.to_string(),
        state,
        phase,
        error: outcome.err(),
    }
}
