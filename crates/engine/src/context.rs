//! Workflow execution context.
//!
//! A [`WorkflowContext`] holds the components of an application revision, the
//! workflow variable tree, and scheduler bookkeeping values. It is materialized
//! once per run from a durable [`RecordData`] map and written back with
//! [`WorkflowContext::commit`] after each step.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde_json::Value;
use stepcore_types::{COMPONENTS_KEY, ComponentManifestRecord, RecordData, VARS_KEY, is_reserved_key};
use tracing::debug;

use crate::document::{List, Node, Path, Struct};
use crate::error::{Result, StepError};

/// Separator used when joining mutable and memory keys.
const KEY_SEPARATOR: &str = "-";

/// A named workload with its auxiliary resources.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    /// Primary resource document.
    pub workload: Node,
    /// Secondary resource documents, in declaration order.
    pub auxiliaries: Vec<Node>,
    /// Opaque scope references carried through from the record.
    pub scopes: Value,
}

impl Component {
    pub fn new(name: impl Into<String>, workload: Node) -> Self {
        Self {
            name: name.into(),
            workload,
            auxiliaries: Vec::new(),
            scopes: Value::Null,
        }
    }

    pub fn with_auxiliary(mut self, auxiliary: Node) -> Self {
        self.auxiliaries.push(auxiliary);
        self
    }

    /// Output form used by `load`: `{workload: ..., auxiliaries: [...]}`.
    pub fn manifest(&self) -> Node {
        let mut fields = Struct::new();
        fields.insert("workload", self.workload.clone());
        fields.insert("auxiliaries", Node::List(List::closed(self.auxiliaries.clone())));
        Node::Struct(fields)
    }

    fn from_record(name: &str, record: ComponentManifestRecord) -> Result<Self> {
        let workload = decode_resource(&record.standard_workload, || format!("workload of component '{name}'"))?;
        let auxiliaries = record
            .traits
            .iter()
            .enumerate()
            .map(|(index, encoded)| decode_resource(encoded, || format!("auxiliary {index} of component '{name}'")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: name.to_string(),
            workload,
            auxiliaries,
            scopes: record.scopes,
        })
    }

    fn to_record(&self) -> Result<ComponentManifestRecord> {
        let standard_workload = encode_resource(&self.workload, || format!("workload of component '{}'", self.name))?;
        let traits = self
            .auxiliaries
            .iter()
            .enumerate()
            .map(|(index, auxiliary)| encode_resource(auxiliary, || format!("auxiliary {index} of component '{}'", self.name)))
            .collect::<Result<Vec<_>>>()?;
        Ok(ComponentManifestRecord {
            scopes: self.scopes.clone(),
            standard_workload,
            traits,
        })
    }
}

/// Shared state visible to every step of one workflow run.
#[derive(Debug, Clone, Default)]
pub struct WorkflowContext {
    components: IndexMap<String, Component>,
    vars: Node,
    mutable: BTreeMap<String, String>,
    memory: HashMap<String, Value>,
}

impl WorkflowContext {
    /// Creates an empty context for a fresh run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Materializes a context from a durable record.
    ///
    /// Any component that fails to decode fails the whole call; no partial
    /// context is returned.
    pub fn from_record(data: &RecordData) -> Result<Self> {
        let mut context = Self::new();

        if let Some(encoded) = data.get(COMPONENTS_KEY) {
            let entries: IndexMap<String, Value> =
                serde_json::from_str(encoded).map_err(|error| StepError::decode("components", error))?;
            for (name, entry) in entries {
                let record = match entry {
                    Value::String(text) => serde_json::from_str::<ComponentManifestRecord>(&text),
                    other => serde_json::from_value::<ComponentManifestRecord>(other),
                }
                .map_err(|error| StepError::decode(format!("component '{name}'"), error))?;
                let component = Component::from_record(&name, record)?;
                context.components.insert(name, component);
            }
        }

        if let Some(encoded) = data.get(VARS_KEY) {
            context.vars = serde_json::from_str(encoded).map_err(|error| StepError::decode("vars", error))?;
        }

        context.mutable = data
            .iter()
            .filter(|(key, _)| !is_reserved_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        debug!(
            components = context.components.len(),
            mutable_values = context.mutable.len(),
            "materialized workflow context"
        );
        Ok(context)
    }

    /// Encodes the persistent part of the context. Memory values are dropped.
    pub fn commit(&self) -> Result<RecordData> {
        let mut data = RecordData::new();

        let mut components = IndexMap::with_capacity(self.components.len());
        for (name, component) in &self.components {
            let record = component.to_record()?;
            let encoded = serde_json::to_string(&record).map_err(|error| StepError::encode(format!("component '{name}'"), error))?;
            components.insert(name.clone(), encoded);
        }
        let components = serde_json::to_string(&components).map_err(|error| StepError::encode("components", error))?;
        data.insert(COMPONENTS_KEY.to_string(), components);

        let vars = serde_json::to_string(&self.vars).map_err(|error| StepError::encode("vars", error))?;
        data.insert(VARS_KEY.to_string(), vars);

        data.extend(self.mutable.iter().map(|(key, value)| (key.clone(), value.clone())));
        Ok(data)
    }

    /// Adds or replaces a component.
    pub fn insert_component(&mut self, component: Component) {
        self.components.insert(component.name.clone(), component);
    }

    pub fn get_component(&self, name: &str) -> Result<&Component> {
        self.components
            .get(name)
            .ok_or_else(|| StepError::ComponentNotFound { name: name.to_string() })
    }

    /// All components in materialization order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Swaps the workload of `name`, leaving its auxiliaries untouched.
    pub fn replace_workload(&mut self, name: &str, workload: Node) -> Result<()> {
        let component = self
            .components
            .get_mut(name)
            .ok_or_else(|| StepError::ComponentNotFound { name: name.to_string() })?;
        component.workload = workload;
        Ok(())
    }

    pub fn get_var(&self, path: &Path) -> Result<&Node> {
        Ok(self.vars.lookup(path)?)
    }

    /// Unifies `value` into the variable tree at `path`.
    pub fn set_var(&mut self, path: &Path, value: Node) -> Result<()> {
        Ok(self.vars.write(path, value)?)
    }

    pub fn vars(&self) -> &Node {
        &self.vars
    }

    /// Stores a persisted string value under the keys joined with `-`.
    pub fn set_mutable_value(&mut self, value: impl Into<String>, keys: &[&str]) -> Result<()> {
        let key = keys.join(KEY_SEPARATOR);
        if is_reserved_key(&key) {
            return Err(StepError::ReservedKey { key });
        }
        self.mutable.insert(key, value.into());
        Ok(())
    }

    pub fn get_mutable_value(&self, keys: &[&str]) -> Option<&str> {
        self.mutable.get(&keys.join(KEY_SEPARATOR)).map(String::as_str)
    }

    pub fn delete_mutable_value(&mut self, keys: &[&str]) -> Option<String> {
        self.mutable.remove(&keys.join(KEY_SEPARATOR))
    }

    /// Stores a process-local value that is never committed.
    pub fn set_value_in_memory(&mut self, value: Value, keys: &[&str]) {
        self.memory.insert(keys.join(KEY_SEPARATOR), value);
    }

    pub fn get_value_in_memory(&self, keys: &[&str]) -> Option<&Value> {
        self.memory.get(&keys.join(KEY_SEPARATOR))
    }

    /// Bumps the counter at `keys` and returns its new value.
    ///
    /// An absent or non-integer counter starts at zero.
    pub fn increase_count_value_in_memory(&mut self, keys: &[&str]) -> i64 {
        let key = keys.join(KEY_SEPARATOR);
        let next = match self.memory.get(&key).and_then(Value::as_i64) {
            Some(count) => count.saturating_add(1),
            None => 0,
        };
        self.memory.insert(key, Value::from(next));
        next
    }
}

fn decode_resource(encoded: &str, what: impl FnOnce() -> String) -> Result<Node> {
    let value: Value = serde_json::from_str(encoded).map_err(|error| StepError::decode(what(), error))?;
    Ok(Node::from_json(&value))
}

fn encode_resource(resource: &Node, what: impl FnOnce() -> String) -> Result<String> {
    let value = resource.to_json()?;
    serde_json::to_string(&value).map_err(|error| StepError::encode(what(), error))
}
