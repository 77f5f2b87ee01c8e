//! Engine configuration payload.
//!
//! The structs here only describe the persisted shape. Locating and reading the
//! file lives in `stepcore_engine::config`.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Patch key applied to container environment lists when no annotation is present.
pub const DEFAULT_ENV_PATCH_PATH: &str = "spec.containers[*].env";

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Settings consumed by the export operation.
    #[serde(default)]
    pub export: ExportConfig,
    /// Settings for the file-backed record store.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Export behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Sequence path (wildcards allowed) to the key field used for keyed patch-merge.
    #[serde(default = "default_patch_keys")]
    pub patch_keys: IndexMap<String, String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            patch_keys: default_patch_keys(),
        }
    }
}

/// Record store location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON file per workflow instance.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_patch_keys() -> IndexMap<String, String> {
    let mut patch_keys = IndexMap::new();
    patch_keys.insert(DEFAULT_ENV_PATCH_PATH.to_string(), "name".to_string());
    patch_keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: EngineConfig = serde_yaml::from_str("{}").expect("parse empty config");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.export.patch_keys.get(DEFAULT_ENV_PATCH_PATH).map(String::as_str), Some("name"));
    }

    #[test]
    fn explicit_patch_keys_replace_defaults() {
        let config: EngineConfig = serde_yaml::from_str(
            r#"
export:
  patch_keys:
    "spec.ports": port
store:
  directory: /var/lib/stepcore
"#,
        )
        .expect("parse config");
        assert_eq!(config.export.patch_keys.len(), 1);
        assert_eq!(config.export.patch_keys["spec.ports"], "port");
        assert_eq!(config.store.directory, Some(PathBuf::from("/var/lib/stepcore")));
    }
}
