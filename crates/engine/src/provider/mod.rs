//! Step operation providers.
//!
//! Modules:
//! - `registry`: name-based dispatch of `(provider, operation)` pairs
//! - `workspace`: the built-in context operations (`load`, `export`, `var`,
//!   `wait`, `break`, `fail`, `message`)

mod registry;
pub mod workspace;

pub use registry::ProviderRegistry;
pub use workspace::WorkspaceProvider;

use crate::action::ActionController;
use crate::context::WorkflowContext;
use crate::document::Node;
use crate::error::Result;

/// A named group of step operations.
///
/// `input` is `None` when the step passed no input document. Operations write
/// their output into the input document and report control flow through
/// `actions`.
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    fn operations(&self) -> &[&'static str];

    fn invoke(
        &self,
        operation: &str,
        context: &mut WorkflowContext,
        input: Option<&mut Node>,
        actions: &mut dyn ActionController,
    ) -> Result<()>;
}
