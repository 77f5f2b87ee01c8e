use std::fmt;

use indexmap::IndexMap;
use stepcore_types::EngineConfig;
use tracing::debug;

use super::{Provider, WorkspaceProvider};
use crate::action::ActionController;
use crate::context::WorkflowContext;
use crate::document::Node;
use crate::error::{Result, StepError};

/// Dispatches step operations to providers by name.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: IndexMap<String, Box<dyn Provider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in workspace provider configured from `config`.
    pub fn with_builtin(config: &EngineConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(WorkspaceProvider::from_config(&config.export)?));
        Ok(registry)
    }

    /// Adds `provider`, returning any provider previously registered under the same name.
    pub fn register(&mut self, provider: Box<dyn Provider>) -> Option<Box<dyn Provider>> {
        let name = provider.name().to_string();
        debug!(provider = %name, operations = provider.operations().len(), "registered step provider");
        self.providers.insert(name, provider)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Provider> {
        self.providers.get(name).map(|provider| provider.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Returns true when `provider` is registered and declares `operation`.
    pub fn contains(&self, provider: &str, operation: &str) -> bool {
        self.get(provider)
            .is_some_and(|provider| provider.operations().contains(&operation))
    }

    /// Runs `operation` of `provider`.
    pub fn invoke(
        &self,
        provider: &str,
        operation: &str,
        context: &mut WorkflowContext,
        input: Option<&mut Node>,
        actions: &mut dyn ActionController,
    ) -> Result<()> {
        match self.get(provider) {
            Some(handler) if handler.operations().contains(&operation) => handler.invoke(operation, context, input, actions),
            _ => Err(StepError::UnknownOperation {
                provider: provider.to_string(),
                operation: operation.to_string(),
            }),
        }
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionRecorder;
    use crate::error::ErrorKind;
    use crate::provider::workspace::PROVIDER_NAME;
    use serde_json::json;

    struct EchoProvider;

    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        fn operations(&self) -> &[&'static str] {
            &["echo"]
        }

        fn invoke(
            &self,
            _operation: &str,
            _context: &mut WorkflowContext,
            input: Option<&mut Node>,
            actions: &mut dyn ActionController,
        ) -> Result<()> {
            let text = input.and_then(|input| input.as_str().map(str::to_string)).unwrap_or_default();
            actions.message(&text);
            Ok(())
        }
    }

    #[test]
    fn builtin_registry_dispatches_by_name() {
        let registry = ProviderRegistry::with_builtin(&EngineConfig::default()).expect("registry");
        assert_eq!(registry.names().collect::<Vec<_>>(), vec![PROVIDER_NAME]);
        assert!(registry.contains(PROVIDER_NAME, "export"));

        let mut context = WorkflowContext::new();
        let mut recorder = ActionRecorder::new();
        let mut input = Node::from_json(&json!({"message": "done"}));
        registry
            .invoke(PROVIDER_NAME, "break", &mut context, Some(&mut input), &mut recorder)
            .expect("break");
        assert!(recorder.state().terminate);
        assert_eq!(recorder.state().message, "done");
    }

    #[test]
    fn unknown_provider_or_operation_fails() {
        let registry = ProviderRegistry::with_builtin(&EngineConfig::default()).expect("registry");
        let mut context = WorkflowContext::new();
        let mut recorder = ActionRecorder::new();

        let error = registry
            .invoke("kube", "apply", &mut context, None, &mut recorder)
            .expect_err("unknown provider");
        assert_eq!(error.kind(), ErrorKind::UnknownOperation);

        let error = registry
            .invoke(PROVIDER_NAME, "apply", &mut context, None, &mut recorder)
            .expect_err("unknown operation");
        assert_eq!(error.to_string(), "unknown operation 'apply' for provider 'builtin'");
    }

    #[test]
    fn custom_providers_can_be_registered() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.register(Box::new(EchoProvider)).is_none());
        assert!(registry.register(Box::new(EchoProvider)).is_some());

        let mut context = WorkflowContext::new();
        let mut recorder = ActionRecorder::new();
        let mut input = Node::string("hello");
        registry
            .invoke("echo", "echo", &mut context, Some(&mut input), &mut recorder)
            .expect("echo");
        assert_eq!(recorder.state().message, "hello");
    }
}
