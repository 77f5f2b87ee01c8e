//! Durable record persistence.
//!
//! The scheduler materializes a [`WorkflowContext`] from a store before a run
//! and commits it back after each step. [`FileRecordStore`] keeps one JSON file
//! per workflow instance; [`MemoryRecordStore`] is meant for tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dirs_next::config_dir;
use stepcore_types::{RecordData, StoreConfig, WorkflowRecord};
use thiserror::Error;
use tracing::debug;

use crate::config::expand_tilde_path;
use crate::context::WorkflowContext;
use crate::error::Result;

/// Default directory name for record files under the config directory.
pub const RECORDS_DIR_NAME: &str = "records";

/// Errors surfaced by record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure while reading or writing a record file.
    #[error("record store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Instance name that cannot be used as a file name.
    #[error("invalid workflow instance name '{instance}'")]
    InvalidInstance { instance: String },
}

/// Shared trait implemented by record persistence backends.
pub trait RecordStore: Send + Sync {
    /// Returns the record of `instance`, or `None` when nothing was stored yet.
    fn load(&self, instance: &str) -> Result<Option<RecordData>, StoreError>;

    /// Stores `data` as the record of `instance`, replacing any previous one.
    fn save(&self, instance: &str, data: &RecordData) -> Result<(), StoreError>;
}

/// In-memory record store primarily used for unit testing.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<String, RecordData>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn load(&self, instance: &str) -> Result<Option<RecordData>, StoreError> {
        let records = self.records.lock().expect("record store lock poisoned");
        Ok(records.get(instance).cloned())
    }

    fn save(&self, instance: &str, data: &RecordData) -> Result<(), StoreError> {
        let mut records = self.records.lock().expect("record store lock poisoned");
        records.insert(instance.to_string(), data.clone());
        Ok(())
    }
}

/// Directory of `<instance>.json` files.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    directory: PathBuf,
}

impl FileRecordStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: expand_tilde_path(directory.into()),
        }
    }

    /// Uses the configured directory, or `<config_dir>/stepcore/records`.
    pub fn from_config(config: &StoreConfig) -> Self {
        match &config.directory {
            Some(directory) => Self::new(directory.clone()),
            None => Self::new(default_records_dir()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn record_path(&self, instance: &str) -> Result<PathBuf, StoreError> {
        let valid = !instance.is_empty()
            && instance != "."
            && instance != ".."
            && !instance.contains(['/', '\\']);
        if !valid {
            return Err(StoreError::InvalidInstance {
                instance: instance.to_string(),
            });
        }
        Ok(self.directory.join(format!("{instance}.json")))
    }
}

impl RecordStore for FileRecordStore {
    fn load(&self, instance: &str) -> Result<Option<RecordData>, StoreError> {
        let path = self.record_path(instance)?;
        match fs::read_to_string(&path) {
            Ok(content) => {
                let record: WorkflowRecord = serde_json::from_str(&content)?;
                Ok(Some(record.data))
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StoreError::Io(error)),
        }
    }

    fn save(&self, instance: &str, data: &RecordData) -> Result<(), StoreError> {
        let path = self.record_path(instance)?;
        fs::create_dir_all(&self.directory)?;
        let record = WorkflowRecord {
            instance: instance.to_string(),
            data: data.clone(),
        };
        fs::write(&path, serde_json::to_string_pretty(&record)?)?;
        debug!(instance, path = %path.display(), "saved workflow record");
        Ok(())
    }
}

/// Materializes the context of `instance`; an instance without a record starts empty.
pub fn materialize(store: &dyn RecordStore, instance: &str) -> Result<WorkflowContext> {
    match store.load(instance)? {
        Some(data) => WorkflowContext::from_record(&data),
        None => {
            debug!(instance, "no stored record, starting with an empty context");
            Ok(WorkflowContext::new())
        }
    }
}

/// Encodes `context` and stores it as the record of `instance`.
pub fn commit(store: &dyn RecordStore, instance: &str, context: &WorkflowContext) -> Result<()> {
    let data = context.commit()?;
    store.save(instance, &data)?;
    Ok(())
}

fn default_records_dir() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(crate::config::CONFIG_DIR_NAME)
        .join(RECORDS_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Node;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryRecordStore::new();
        assert!(store.load("app-v1").expect("load").is_none());

        let mut context = materialize(&store, "app-v1").expect("empty context");
        context
            .set_var(&"endpoint.ip".parse().expect("path"), Node::string("1.1.1.1"))
            .expect("set var");
        commit(&store, "app-v1", &context).expect("commit");

        let restored = materialize(&store, "app-v1").expect("restore");
        assert_eq!(restored.vars(), context.vars());
    }

    #[test]
    fn file_store_persists_records() {
        let dir = tempdir().expect("tempdir");
        let store = FileRecordStore::new(dir.path().join("records"));

        let mut context = WorkflowContext::new();
        context.set_mutable_value("done", &["step", "apply"]).expect("mutable");
        commit(&store, "app-v1", &context).expect("commit");
        assert!(dir.path().join("records").join("app-v1.json").exists());

        let reloaded = FileRecordStore::new(dir.path().join("records"));
        let restored = materialize(&reloaded, "app-v1").expect("restore");
        assert_eq!(restored.get_mutable_value(&["step", "apply"]), Some("done"));
        assert!(reloaded.load("other").expect("load").is_none());
    }

    #[test]
    fn file_store_rejects_path_like_instances() {
        let dir = tempdir().expect("tempdir");
        let store = FileRecordStore::new(dir.path());
        for instance in ["", "..", "a/b", "a\\b"] {
            let error = store.load(instance).expect_err("invalid instance");
            assert!(matches!(error, StoreError::InvalidInstance { .. }), "{instance}");
        }
        let error = materialize(&store, "../escape").expect_err("invalid instance");
        assert_eq!(error.kind(), ErrorKind::Store);
    }

    #[test]
    fn corrupt_record_files_surface_as_errors() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("broken.json"), "{").expect("write");
        let store = FileRecordStore::new(dir.path());
        let error = store.load("broken").expect_err("corrupt file");
        assert!(matches!(error, StoreError::Serialization(_)));
    }
}
