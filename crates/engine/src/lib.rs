//! # Stepcore Engine
//!
//! Step-execution core of a workflow engine for multi-resource application
//! deployments. A workflow is a sequence of steps; each step calls primitive
//! operations against a shared [`WorkflowContext`] to read and patch resource
//! manifests, read and write workflow variables, and signal control flow
//! (wait, suspend, terminate, fail) back to the scheduler.
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use stepcore_engine::{Component, Node, ProviderRegistry, WorkflowContext, run_step};
//! use stepcore_types::{EngineConfig, StepPhase};
//!
//! let registry = ProviderRegistry::with_builtin(&EngineConfig::default())?;
//! let mut context = WorkflowContext::new();
//! context.insert_component(Component::new("server", Node::from_json(&json!({"kind": "Pod"}))));
//!
//! let mut input = Node::from_json(&json!({"component": "server"}));
//! let report = run_step(&registry, &mut context, "builtin", "load", Some(&mut input));
//! assert!(report.is_ok());
//! assert_eq!(report.phase, StepPhase::Running);
//! assert_eq!(input.lookup_string(&"value.workload.kind".parse()?)?, "Pod");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`document`**: structured documents, unification and keyed patch-merge
//! - **`context`**: components, variables and bookkeeping values of one run
//! - **`action`**: the controller operations report control flow through
//! - **`provider`**: built-in operations and name-based dispatch
//! - **`step`**: runs one operation with a fresh controller
//! - **`store`**: durable record persistence
//! - **`config`**: engine configuration loading

pub mod action;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod provider;
pub mod step;
pub mod store;

pub use action::{ActionController, ActionRecorder, ActionState};
pub use config::{load_config, load_config_from};
pub use context::{Component, WorkflowContext};
pub use document::{DocumentError, Kind, List, Node, PatchKeyHints, Path, Scalar, Segment, Struct, unify};
pub use error::{ErrorKind, StepError};
pub use provider::{Provider, ProviderRegistry, WorkspaceProvider};
pub use step::{StepReport, run_step};
pub use store::{FileRecordStore, MemoryRecordStore, RecordStore, StoreError};
