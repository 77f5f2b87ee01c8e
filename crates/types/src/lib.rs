//! Shared data types for the stepcore workspace.
//!
//! These types describe what crosses a boundary: the durable workflow record,
//! the phase a step lands in, and the persisted engine configuration. They carry
//! no behaviour beyond serde and small helpers.

pub mod config;
pub mod phase;
pub mod record;

pub use config::{DEFAULT_ENV_PATCH_PATH, EngineConfig, ExportConfig, StoreConfig};
pub use phase::{StepPhase, TerminateOutcome, TerminationStatus};
pub use record::{COMPONENTS_KEY, ComponentManifestRecord, RecordData, VARS_KEY, WorkflowRecord, is_reserved_key};
