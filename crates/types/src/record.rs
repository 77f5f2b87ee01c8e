//! Durable workflow record format.
//!
//! A workflow instance persists its execution context as a flat string map,
//! mirroring the `data` section of a key-value record. Two keys are reserved:
//!
//! - [`COMPONENTS_KEY`]: a JSON object string mapping component names to the
//!   JSON encoding of a [`ComponentManifestRecord`]
//! - [`VARS_KEY`]: the serialized variable tree
//!
//! Every other key carries a mutable string value owned by the scheduler.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Flat string map persisted for a single workflow instance.
pub type RecordData = BTreeMap<String, String>;

/// Record key holding the encoded component set.
pub const COMPONENTS_KEY: &str = "components";

/// Record key holding the encoded variable tree.
pub const VARS_KEY: &str = "vars";

/// Returns true when `key` is reserved for context state rather than a mutable value.
pub fn is_reserved_key(key: &str) -> bool {
    key == COMPONENTS_KEY || key == VARS_KEY
}

/// Serialized form of a single component.
///
/// Field names follow the persisted casing. The workload and every trait are
/// themselves JSON documents embedded as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentManifestRecord {
    /// Opaque scope references; carried through untouched.
    #[serde(rename = "Scopes", default)]
    pub scopes: Value,
    /// JSON encoding of the workload resource.
    #[serde(rename = "StandardWorkload", default)]
    pub standard_workload: String,
    /// JSON encodings of the auxiliary resources, in order.
    #[serde(rename = "Traits", default, deserialize_with = "null_as_default")]
    pub traits: Vec<String>,
}

/// A durable record as stored on disk or handed over by the persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    /// Workflow instance the record belongs to.
    #[serde(alias = "name")]
    pub instance: String,
    /// Persisted context state.
    #[serde(default)]
    pub data: RecordData,
}

impl WorkflowRecord {
    /// Creates an empty record for `instance`.
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            data: RecordData::new(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_component_with_null_traits() {
        let encoded = r#"{"Scopes":null,"StandardWorkload":"{\"kind\":\"Pod\"}","Traits":null}"#;
        let record: ComponentManifestRecord = serde_json::from_str(encoded).expect("decode component");
        assert_eq!(record.standard_workload, r#"{"kind":"Pod"}"#);
        assert!(record.traits.is_empty());
        assert_eq!(record.scopes, Value::Null);
    }

    #[test]
    fn accepts_name_alias_for_instance() {
        let record: WorkflowRecord = serde_yaml::from_str("name: app-v1\ndata:\n  step-a: done\n").expect("decode record");
        assert_eq!(record.instance, "app-v1");
        assert_eq!(record.data.get("step-a").map(String::as_str), Some("done"));
    }

    #[test]
    fn reserved_keys_are_detected() {
        assert!(is_reserved_key("components"));
        assert!(is_reserved_key("vars"));
        assert!(!is_reserved_key("step-a"));
    }
}
