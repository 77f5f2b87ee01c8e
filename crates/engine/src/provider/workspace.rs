//! Built-in operations over the workflow context.
//!
//! Every operation reads a small, fixed set of fields from its input document.
//! Outputs are written to the input's `value` field with [`Node::fill`] so a
//! repeated call with the same input produces the same document.

use stepcore_types::ExportConfig;
use tracing::debug;

use super::Provider;
use crate::action::ActionController;
use crate::context::WorkflowContext;
use crate::document::{DocumentError, Node, PatchKeyHints, Path, Segment};
use crate::error::{Result, StepError};

/// Registry name of this provider.
pub const PROVIDER_NAME: &str = "builtin";

pub const LOAD: &str = "load";
pub const EXPORT: &str = "export";
pub const VAR: &str = "var";
pub const WAIT: &str = "wait";
pub const BREAK: &str = "break";
pub const FAIL: &str = "fail";
pub const MESSAGE: &str = "message";

const OPERATIONS: &[&str] = &[LOAD, EXPORT, VAR, WAIT, BREAK, FAIL, MESSAGE];

const COMPONENT_FIELD: &str = "component";
const VALUE_FIELD: &str = "value";
const METHOD_FIELD: &str = "method";
const PATH_FIELD: &str = "path";
const CONTINUE_FIELD: &str = "continue";
const MESSAGE_FIELD: &str = "message";

/// Provider exposing the context operations.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceProvider {
    patch_keys: PatchKeyHints,
}

impl WorkspaceProvider {
    pub fn new(patch_keys: PatchKeyHints) -> Self {
        Self { patch_keys }
    }

    /// Builds the provider from configured `path -> key` hints.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        Ok(Self::new(PatchKeyHints::from_patch_keys(&config.patch_keys)?))
    }

    pub fn patch_keys(&self) -> &PatchKeyHints {
        &self.patch_keys
    }
}

impl Default for WorkspaceProvider {
    fn default() -> Self {
        let env = Path::new(vec![
            Segment::Field("spec".to_string()),
            Segment::Field("containers".to_string()),
            Segment::Wildcard,
            Segment::Field("env".to_string()),
        ]);
        Self::new(PatchKeyHints::new().with(env, "name"))
    }
}

impl Provider for WorkspaceProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn operations(&self) -> &[&'static str] {
        OPERATIONS
    }

    fn invoke(
        &self,
        operation: &str,
        context: &mut WorkflowContext,
        input: Option<&mut Node>,
        actions: &mut dyn ActionController,
    ) -> Result<()> {
        match operation {
            LOAD => load(context, input),
            EXPORT => export(context, input, &self.patch_keys),
            VAR => do_var(context, input),
            WAIT => {
                wait(input.as_deref(), actions);
                Ok(())
            }
            BREAK => {
                break_step(input.as_deref(), actions);
                Ok(())
            }
            FAIL => {
                fail(input.as_deref(), actions);
                Ok(())
            }
            MESSAGE => {
                message(input.as_deref(), actions);
                Ok(())
            }
            other => Err(StepError::UnknownOperation {
                provider: PROVIDER_NAME.to_string(),
                operation: other.to_string(),
            }),
        }
    }
}

/// Writes component manifests into `value`.
///
/// With a `component` field the output is that component's manifest; without
/// one it is a struct of every manifest keyed by component name.
pub fn load(context: &WorkflowContext, input: Option<&mut Node>) -> Result<()> {
    let input = input.ok_or(StepError::MissingInput { operation: LOAD })?;
    let value = match input.optional_string(&Path::field(COMPONENT_FIELD))? {
        Some(name) => context.get_component(name)?.manifest(),
        None => Node::Struct(
            context
                .components()
                .map(|component| (component.name.clone(), component.manifest()))
                .collect(),
        ),
    };
    input.fill(&Path::field(VALUE_FIELD), value)?;
    Ok(())
}

/// Patch-merges `value` into the workload of `component`.
///
/// The workload is only replaced once the merge fully succeeded and the result
/// is concrete. A patch leaving an unresolved constraint in the workload fails
/// with `Unresolved`.
pub fn export(context: &mut WorkflowContext, input: Option<&mut Node>, patch_keys: &PatchKeyHints) -> Result<()> {
    let input = input.ok_or(StepError::MissingInput { operation: EXPORT })?;
    let name = required_string(input, EXPORT, COMPONENT_FIELD)?;
    let patch = input
        .optional(&Path::field(VALUE_FIELD))?
        .ok_or(StepError::MissingField {
            operation: EXPORT,
            field: VALUE_FIELD,
        })?;

    let merged = context.get_component(name)?.workload.merge(patch, patch_keys)?;
    merged.to_json()?;
    context.replace_workload(name, merged)?;
    debug!(component = name, "exported patch into component workload");
    Ok(())
}

/// Reads (`Get`) or writes (`Put`) a workflow variable at `path`.
pub fn do_var(context: &mut WorkflowContext, input: Option<&mut Node>) -> Result<()> {
    let input = input.ok_or(StepError::MissingInput { operation: VAR })?;
    let method = required_string(input, VAR, METHOD_FIELD)?.to_string();
    let path: Path = required_string(input, VAR, PATH_FIELD)?.parse()?;

    match method.as_str() {
        "Get" => {
            let value = context.get_var(&path)?;
            // a variable without a concrete value has not been set yet
            if !value.is_concrete() {
                return Err(DocumentError::NotFound { path }.into());
            }
            let value = value.clone();
            input.fill(&Path::field(VALUE_FIELD), value)?;
        }
        "Put" => {
            let value = input
                .optional(&Path::field(VALUE_FIELD))?
                .cloned()
                .ok_or(StepError::MissingField {
                    operation: VAR,
                    field: VALUE_FIELD,
                })?;
            context.set_var(&path, value)?;
        }
        other => {
            return Err(StepError::UnsupportedMethod {
                operation: VAR,
                method: other.to_string(),
            });
        }
    }
    Ok(())
}

/// Requests a wait unless `continue` is concretely true.
///
/// An unresolved or unreadable `continue` waits, the same as `false`.
pub fn wait(input: Option<&Node>, actions: &mut dyn ActionController) {
    if let Some(input) = input
        && matches!(input.lookup_bool(&Path::field(CONTINUE_FIELD)), Ok(true))
    {
        return;
    }
    actions.wait(message_of(input));
}

/// Terminates the workflow with the input's message, or an empty one.
pub fn break_step(input: Option<&Node>, actions: &mut dyn ActionController) {
    actions.terminate(message_of(input));
}

/// Fails the workflow with the input's message, or an empty one.
pub fn fail(input: Option<&Node>, actions: &mut dyn ActionController) {
    actions.fail(message_of(input));
}

/// Records the input's message. A missing message leaves the previous one.
pub fn message(input: Option<&Node>, actions: &mut dyn ActionController) {
    let text = message_of(input);
    if !text.is_empty() {
        actions.message(text);
    }
}

fn required_string<'a>(input: &'a Node, operation: &'static str, field: &'static str) -> Result<&'a str> {
    input
        .optional_string(&Path::field(field))?
        .ok_or(StepError::MissingField { operation, field })
}

fn message_of(input: Option<&Node>) -> &str {
    let Some(input) = input else {
        return "";
    };
    match input.optional_string(&Path::field(MESSAGE_FIELD)) {
        Ok(text) => text.unwrap_or_default(),
        Err(error) => {
            debug!(error = %error, "ignoring unreadable message field");
            ""
        }
    }
}
