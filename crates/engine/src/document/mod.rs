//! # Structured documents
//!
//! Resource manifests, step inputs, and workflow variables are all represented
//! as [`Node`] trees. A node is either concrete (scalar, list, struct), an
//! unresolved [`Kind`] constraint such as "any boolean", or bottom: the result
//! of contradictory information.
//!
//! Documents combine through *unification* ([`unify`]): fields present on both
//! sides are unified recursively, fields present on one side pass through, and
//! incompatible scalars collapse to bottom. Resource patches use
//! [`Node::merge`], which additionally supports keyed list patching driven by a
//! patch-key annotation carried on the list itself or by [`PatchKeyHints`].
//!
//! All mutating operations are copy-on-write: a failed write or merge leaves the
//! original document untouched.

mod merge;
mod path;
mod render;
mod unify;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

pub use merge::PatchKeyHints;
pub use path::{Path, Segment};
pub use unify::unify;

/// Errors raised while reading or updating a document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("path '{path}' not found")]
    NotFound { path: Path },
    #[error("type mismatch at '{path}': {detail}")]
    TypeMismatch { path: Path, detail: String },
    #[error("conflict at '{path}': {detail}")]
    Conflict { path: Path, detail: String },
    #[error("value at '{path}' is unresolved (still {kind})")]
    Unresolved { path: Path, kind: Kind },
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl DocumentError {
    /// Converts a bottom value found at `base` into an error.
    pub fn from_conflict(base: &Path, conflict: &Conflict) -> Self {
        let path = base.join(&conflict.at);
        match conflict.kind {
            ConflictKind::Value => DocumentError::Conflict {
                path,
                detail: conflict.detail.clone(),
            },
            ConflictKind::Type => DocumentError::TypeMismatch {
                path,
                detail: conflict.detail.clone(),
            },
        }
    }

    fn mismatch(path: &Path, expected: &str, found: Kind) -> Self {
        DocumentError::TypeMismatch {
            path: path.clone(),
            detail: format!("expected {expected}, found {found}"),
        }
    }
}

/// Concrete leaf value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    String(String),
    Number(Number),
    Bool(bool),
    Null,
}

impl Scalar {
    pub fn kind(&self) -> Kind {
        match self {
            Scalar::String(_) => Kind::String,
            Scalar::Number(_) => Kind::Number,
            Scalar::Bool(_) => Kind::Bool,
            Scalar::Null => Kind::Null,
        }
    }

    /// Value equality. Integers compare exactly; a float compares numerically.
    pub fn same_value(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Number(left), Scalar::Number(right)) if left.is_f64() || right.is_f64() => {
                matches!((left.as_f64(), right.as_f64()), (Some(l), Some(r)) if l == r)
            }
            (left, right) => left == right,
        }
    }
}

/// Shape of a value, used both for unresolved constraints and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Top: any value, including containers.
    Any,
    String,
    Number,
    Bool,
    Null,
    List,
    Struct,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Any => "_",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Bool => "bool",
            Kind::Null => "null",
            Kind::List => "[..._]",
            Kind::Struct => "{...}",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a node became bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Two different concrete values.
    Value,
    /// Two incompatible shapes.
    Type,
}

/// Payload of a bottom node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    /// Location of the contradiction relative to the node carrying it.
    #[serde(default)]
    pub at: Path,
    pub detail: String,
}

impl Conflict {
    pub fn value(detail: impl Into<String>) -> Self {
        Self {
            kind: ConflictKind::Value,
            at: Path::root(),
            detail: detail.into(),
        }
    }

    pub fn type_mismatch(left: Kind, right: Kind) -> Self {
        Self {
            kind: ConflictKind::Type,
            at: Path::root(),
            detail: format!("incompatible kinds {left} and {right}"),
        }
    }

    /// Re-anchors the conflict one level deeper.
    pub(crate) fn within(&self, segment: Segment) -> Self {
        let mut at = Path::new(vec![segment]);
        at = at.join(&self.at);
        Self {
            kind: self.kind,
            at,
            detail: self.detail.clone(),
        }
    }
}

/// Ordered sequence of nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub items: Vec<Node>,
    /// Open lists accept additional trailing elements.
    #[serde(default)]
    pub open: bool,
    /// Field used to match elements during keyed patch-merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_key: Option<String>,
}

impl List {
    pub fn closed(items: Vec<Node>) -> Self {
        Self {
            items,
            open: false,
            patch_key: None,
        }
    }

    pub fn open(items: Vec<Node>) -> Self {
        Self {
            items,
            open: true,
            patch_key: None,
        }
    }

    pub fn with_patch_key(mut self, key: impl Into<String>) -> Self {
        self.patch_key = Some(key.into());
        self
    }
}

/// Mapping from field name to node. Field order carries no meaning; fields are
/// kept sorted so rendering is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Struct {
    fields: BTreeMap<String, Node>,
}

impl Struct {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.fields.get_mut(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, node: Node) -> Option<Node> {
        self.fields.insert(name.into(), node)
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.fields.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn entry(&mut self, name: &str) -> &mut Node {
        self.fields.entry(name.to_string()).or_insert(Node::Constraint(Kind::Any))
    }
}

impl FromIterator<(String, Node)> for Struct {
    fn from_iter<T: IntoIterator<Item = (String, Node)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// A document tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Scalar(Scalar),
    List(List),
    Struct(Struct),
    /// Unresolved value constrained to a kind.
    Constraint(Kind),
    /// Contradictory value; every operation reaching it fails.
    Bottom(Conflict),
}

impl Default for Node {
    fn default() -> Self {
        Node::Struct(Struct::new())
    }
}

impl Node {
    pub fn string(value: impl Into<String>) -> Self {
        Node::Scalar(Scalar::String(value.into()))
    }

    pub fn bool(value: bool) -> Self {
        Node::Scalar(Scalar::Bool(value))
    }

    pub fn number(value: impl Into<Number>) -> Self {
        Node::Scalar(Scalar::Number(value.into()))
    }

    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    pub fn empty_struct() -> Self {
        Node::Struct(Struct::new())
    }

    pub fn constraint(kind: Kind) -> Self {
        Node::Constraint(kind)
    }

    pub fn bottom(detail: impl Into<String>) -> Self {
        Node::Bottom(Conflict::value(detail))
    }

    /// Converts a JSON value. Arrays become closed lists without annotations.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Node::null(),
            Value::Bool(flag) => Node::bool(*flag),
            Value::Number(number) => Node::Scalar(Scalar::Number(number.clone())),
            Value::String(text) => Node::string(text.clone()),
            Value::Array(items) => Node::List(List::closed(items.iter().map(Node::from_json).collect())),
            Value::Object(map) => Node::Struct(map.iter().map(|(key, value)| (key.clone(), Node::from_json(value))).collect()),
        }
    }

    /// Converts a fully concrete tree back to JSON.
    ///
    /// Open markers and patch-key annotations are dropped; unresolved and bottom
    /// nodes are rejected.
    pub fn to_json(&self) -> Result<Value, DocumentError> {
        let mut path = Path::root();
        to_json_at(self, &mut path)
    }

    pub fn kind(&self) -> Kind {
        match self {
            Node::Scalar(scalar) => scalar.kind(),
            Node::List(_) => Kind::List,
            Node::Struct(_) => Kind::Struct,
            Node::Constraint(kind) => *kind,
            Node::Bottom(_) => Kind::Any,
        }
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Node::Bottom(_))
    }

    /// Returns true when neither this node nor any descendant is a constraint or bottom.
    pub fn is_concrete(&self) -> bool {
        match self {
            Node::Scalar(_) => true,
            Node::List(list) => list.items.iter().all(Node::is_concrete),
            Node::Struct(fields) => fields.iter().all(|(_, node)| node.is_concrete()),
            Node::Constraint(_) | Node::Bottom(_) => false,
        }
    }

    /// Returns the first bottom in this tree, anchored relative to this node.
    pub fn find_bottom(&self) -> Option<Conflict> {
        match self {
            Node::Bottom(conflict) => Some(conflict.clone()),
            Node::List(list) => list.items.iter().enumerate().find_map(|(index, item)| {
                item.find_bottom()
                    .map(|conflict| conflict.within(Segment::Index(index)))
            }),
            Node::Struct(fields) => fields.iter().find_map(|(name, field)| {
                field
                    .find_bottom()
                    .map(|conflict| conflict.within(Segment::Field(name.clone())))
            }),
            Node::Scalar(_) | Node::Constraint(_) => None,
        }
    }

    /// Direct struct field access without path parsing.
    pub fn field(&self, name: &str) -> Option<&Node> {
        match self {
            Node::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Descends along `path`.
    ///
    /// Fails with `NotFound` when a segment is absent, `TypeMismatch` when the
    /// path descends into a scalar, and `Conflict` when it reaches bottom.
    /// Unresolved nodes are returned as-is; use [`Node::lookup_concrete`] when a
    /// concrete value is required.
    pub fn lookup(&self, path: &Path) -> Result<&Node, DocumentError> {
        let mut current = self;
        for (depth, segment) in path.segments().iter().enumerate() {
            let here = path.prefix(depth);
            current = match (segment, current) {
                (_, Node::Bottom(conflict)) => return Err(DocumentError::from_conflict(&here, conflict)),
                (Segment::Wildcard, _) => {
                    return Err(DocumentError::InvalidPath {
                        path: path.to_string(),
                        reason: "wildcards cannot be looked up".to_string(),
                    });
                }
                (Segment::Field(name), Node::Struct(fields)) => fields
                    .get(name)
                    .ok_or_else(|| DocumentError::NotFound { path: path.prefix(depth + 1) })?,
                (Segment::Index(index), Node::List(list)) => list
                    .items
                    .get(*index)
                    .ok_or_else(|| DocumentError::NotFound { path: path.prefix(depth + 1) })?,
                (_, Node::Constraint(Kind::Any | Kind::Struct | Kind::List)) => {
                    return Err(DocumentError::NotFound { path: path.prefix(depth + 1) });
                }
                (Segment::Field(_), other) => return Err(DocumentError::mismatch(&here, "struct", other.kind())),
                (Segment::Index(_), other) => return Err(DocumentError::mismatch(&here, "list", other.kind())),
            };
        }
        if let Node::Bottom(conflict) = current {
            return Err(DocumentError::from_conflict(path, conflict));
        }
        Ok(current)
    }

    /// Like [`Node::lookup`], but an absent path yields `Ok(None)`.
    pub fn optional(&self, path: &Path) -> Result<Option<&Node>, DocumentError> {
        match self.lookup(path) {
            Ok(node) => Ok(Some(node)),
            Err(DocumentError::NotFound { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Looks up a node that must be fully concrete.
    pub fn lookup_concrete(&self, path: &Path) -> Result<&Node, DocumentError> {
        let node = self.lookup(path)?;
        if let Node::Constraint(kind) = node {
            return Err(DocumentError::Unresolved {
                path: path.clone(),
                kind: *kind,
            });
        }
        if !node.is_concrete() {
            return Err(DocumentError::Unresolved {
                path: path.clone(),
                kind: node.kind(),
            });
        }
        Ok(node)
    }

    pub fn lookup_string(&self, path: &Path) -> Result<&str, DocumentError> {
        match self.lookup_concrete(path)? {
            Node::Scalar(Scalar::String(text)) => Ok(text),
            other => Err(DocumentError::mismatch(path, "string", other.kind())),
        }
    }

    pub fn lookup_bool(&self, path: &Path) -> Result<bool, DocumentError> {
        match self.lookup_concrete(path)? {
            Node::Scalar(Scalar::Bool(flag)) => Ok(*flag),
            other => Err(DocumentError::mismatch(path, "bool", other.kind())),
        }
    }

    /// Like [`Node::lookup_string`], but an absent path yields `Ok(None)`.
    pub fn optional_string(&self, path: &Path) -> Result<Option<&str>, DocumentError> {
        match self.lookup_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(DocumentError::NotFound { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Unifies `value` into the node at `path`, creating intermediate structs.
    pub fn write(&mut self, path: &Path, value: Node) -> Result<(), DocumentError> {
        self.update(path, value, WriteMode::Unify)
    }

    /// Replaces the node at `path` with `value`, creating intermediate structs.
    ///
    /// Used for operation outputs so repeated calls do not conflict with the
    /// value written by the previous call.
    pub fn fill(&mut self, path: &Path, value: Node) -> Result<(), DocumentError> {
        self.update(path, value, WriteMode::Replace)
    }

    /// Sets the patch-key annotation on the list at `path`.
    pub fn annotate_patch_key(&mut self, path: &Path, key: impl Into<String>) -> Result<(), DocumentError> {
        let mut updated = self.clone();
        match descend_mut(&mut updated, path, false)? {
            Node::List(list) => list.patch_key = Some(key.into()),
            other => return Err(DocumentError::mismatch(path, "list", other.kind())),
        }
        *self = updated;
        Ok(())
    }

    fn update(&mut self, path: &Path, value: Node, mode: WriteMode) -> Result<(), DocumentError> {
        let mut updated = self.clone();
        let slot = descend_mut(&mut updated, path, true)?;
        match mode {
            WriteMode::Replace => *slot = value,
            WriteMode::Unify => {
                let unified = unify(slot, &value);
                if let Node::Bottom(conflict) = &unified {
                    return Err(DocumentError::from_conflict(path, conflict));
                }
                *slot = unified;
            }
        }
        *self = updated;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum WriteMode {
    Unify,
    Replace,
}

fn descend_mut<'a>(root: &'a mut Node, path: &Path, create: bool) -> Result<&'a mut Node, DocumentError> {
    let mut current = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        if matches!(segment, Segment::Wildcard) {
            return Err(DocumentError::InvalidPath {
                path: path.to_string(),
                reason: "wildcards cannot be written".to_string(),
            });
        }
        if create && matches!(segment, Segment::Field(_)) && matches!(current, Node::Constraint(Kind::Any | Kind::Struct)) {
            *current = Node::empty_struct();
        }
        let expected = match segment {
            Segment::Index(_) => "list",
            _ => "struct",
        };
        let kind = current.kind();
        current = match current {
            Node::Bottom(conflict) => return Err(DocumentError::from_conflict(&path.prefix(depth), conflict)),
            Node::Struct(fields) => match segment {
                Segment::Field(name) if create => fields.entry(name),
                Segment::Field(name) => fields
                    .get_mut(name)
                    .ok_or_else(|| DocumentError::NotFound { path: path.prefix(depth + 1) })?,
                _ => return Err(DocumentError::mismatch(&path.prefix(depth), expected, kind)),
            },
            Node::List(list) => match segment {
                Segment::Index(index) => list
                    .items
                    .get_mut(*index)
                    .ok_or_else(|| DocumentError::NotFound { path: path.prefix(depth + 1) })?,
                _ => return Err(DocumentError::mismatch(&path.prefix(depth), expected, kind)),
            },
            Node::Constraint(_) => return Err(DocumentError::NotFound { path: path.prefix(depth + 1) }),
            Node::Scalar(_) => return Err(DocumentError::mismatch(&path.prefix(depth), expected, kind)),
        };
    }
    Ok(current)
}

fn to_json_at(node: &Node, path: &mut Path) -> Result<Value, DocumentError> {
    match node {
        Node::Scalar(Scalar::String(text)) => Ok(Value::String(text.clone())),
        Node::Scalar(Scalar::Number(number)) => Ok(Value::Number(number.clone())),
        Node::Scalar(Scalar::Bool(flag)) => Ok(Value::Bool(*flag)),
        Node::Scalar(Scalar::Null) => Ok(Value::Null),
        Node::List(list) => {
            let mut items = Vec::with_capacity(list.items.len());
            for (index, item) in list.items.iter().enumerate() {
                path.push(Segment::Index(index));
                items.push(to_json_at(item, path)?);
                path.pop();
            }
            Ok(Value::Array(items))
        }
        Node::Struct(fields) => {
            let mut map = serde_json::Map::new();
            for (name, field) in fields.iter() {
                path.push(Segment::Field(name.clone()));
                map.insert(name.clone(), to_json_at(field, path)?);
                path.pop();
            }
            Ok(Value::Object(map))
        }
        Node::Constraint(kind) => Err(DocumentError::Unresolved {
            path: path.clone(),
            kind: *kind,
        }),
        Node::Bottom(conflict) => Err(DocumentError::from_conflict(path, conflict)),
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::string(value)
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::string(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::bool(value)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::number(value)
    }
}

impl From<Struct> for Node {
    fn from(value: Struct) -> Self {
        Node::Struct(value)
    }
}

impl From<List> for Node {
    fn from(value: List) -> Self {
        Node::List(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(text: &str) -> Path {
        text.parse().expect("valid path")
    }

    #[test]
    fn lookup_descends_structs_and_lists() {
        let document = Node::from_json(&json!({
            "spec": {"containers": [{"name": "main", "image": "nginx"}]}
        }));

        let image = document.lookup_string(&path("spec.containers[0].image")).expect("image");
        assert_eq!(image, "nginx");

        let missing = document.lookup(&path("spec.volumes")).expect_err("volumes absent");
        assert_eq!(missing, DocumentError::NotFound { path: path("spec.volumes") });

        let out_of_range = document.lookup(&path("spec.containers[3]")).expect_err("index absent");
        assert!(matches!(out_of_range, DocumentError::NotFound { .. }));

        let through_scalar = document.lookup(&path("spec.containers[0].image.tag")).expect_err("scalar has no fields");
        assert!(matches!(through_scalar, DocumentError::TypeMismatch { .. }));
    }

    #[test]
    fn typed_lookups_distinguish_failure_kinds() {
        let mut fields = Struct::new();
        fields.insert("number", Node::number(124));
        fields.insert("pending", Node::constraint(Kind::String));
        fields.insert("broken", Node::bottom("explicit bottom"));
        let document = Node::Struct(fields);

        assert!(matches!(
            document.lookup_string(&Path::field("number")),
            Err(DocumentError::TypeMismatch { .. })
        ));
        assert!(matches!(
            document.lookup_string(&Path::field("pending")),
            Err(DocumentError::Unresolved { kind: Kind::String, .. })
        ));
        assert!(matches!(
            document.lookup_string(&Path::field("broken")),
            Err(DocumentError::Conflict { .. })
        ));
        assert_eq!(document.optional_string(&Path::field("absent")).expect("absent is fine"), None);
    }

    #[test]
    fn write_creates_intermediate_structs_and_unifies() {
        let mut document = Node::empty_struct();
        document.write(&path("network.cluster.ip"), Node::string("1.1.1.1")).expect("first write");
        assert_eq!(document.lookup_string(&path("network.cluster.ip")).expect("ip"), "1.1.1.1");

        document
            .write(&path("network.cluster.ip"), Node::string("1.1.1.1"))
            .expect("identical value unifies");
        document
            .write(&path("network.cluster"), Node::from_json(&json!({"port": 80})))
            .expect("new field unifies into existing struct");
        assert_eq!(document.lookup(&path("network.cluster.port")).expect("port"), &Node::number(80));
    }

    #[test]
    fn failed_write_leaves_document_untouched() {
        let mut document = Node::from_json(&json!({"a": {"b": "x"}}));
        let before = document.clone();

        let conflict = document.write(&path("a.b"), Node::string("y")).expect_err("values conflict");
        assert!(matches!(conflict, DocumentError::Conflict { .. }));
        assert_eq!(document, before);

        let mismatch = document.write(&path("a.b.c"), Node::string("z")).expect_err("cannot descend into scalar");
        assert!(matches!(mismatch, DocumentError::TypeMismatch { .. }));
        assert_eq!(document, before);
    }

    #[test]
    fn fill_replaces_existing_values() {
        let mut document = Node::from_json(&json!({"value": "old"}));
        document.fill(&Path::field("value"), Node::string("new")).expect("fill");
        assert_eq!(document.lookup_string(&Path::field("value")).expect("value"), "new");
    }

    #[test]
    fn write_resolves_constraints() {
        let mut document = Node::empty_struct();
        document.write(&Path::field("enabled"), Node::constraint(Kind::Bool)).expect("constraint");
        assert!(matches!(
            document.lookup_bool(&Path::field("enabled")),
            Err(DocumentError::Unresolved { .. })
        ));
        document.write(&Path::field("enabled"), Node::bool(true)).expect("resolve constraint");
        assert!(document.lookup_bool(&Path::field("enabled")).expect("resolved"));
    }

    #[test]
    fn json_round_trip_and_rejection_of_partial_values() {
        let value = json!({"kind": "Pod", "spec": {"replicas": 2, "paused": false, "note": null, "tags": ["a", "b"]}});
        let document = Node::from_json(&value);
        assert!(document.is_concrete());
        assert_eq!(document.to_json().expect("concrete"), value);

        let mut partial = document.clone();
        partial.write(&path("spec.owner"), Node::constraint(Kind::String)).expect("add constraint");
        let error = partial.to_json().expect_err("constraint is not serializable as JSON");
        assert_eq!(
            error,
            DocumentError::Unresolved {
                path: path("spec.owner"),
                kind: Kind::String
            }
        );
    }

    #[test]
    fn large_integers_compare_exactly() {
        let above = Scalar::Number(9_007_199_254_740_993_u64.into());
        let below = Scalar::Number(9_007_199_254_740_992_u64.into());
        assert!(!above.same_value(&below));
        assert!(above.same_value(&above.clone()));

        let Value::Number(float) = json!(2.0) else {
            panic!("expected number");
        };
        assert!(Scalar::Number(2_i64.into()).same_value(&Scalar::Number(float)));
    }

    #[test]
    fn find_bottom_locates_nested_conflicts() {
        let mut nested = Struct::new();
        nested.insert("nested", Node::bottom("explicit bottom"));
        let mut fields = Struct::new();
        fields.insert("extra", Node::List(List::closed(vec![Node::null(), Node::Struct(nested)])));
        let document = Node::Struct(fields);

        let conflict = document.find_bottom().expect("bottom present");
        assert_eq!(conflict.at, path("extra[1].nested"));
        assert_eq!(Node::from_json(&json!({"a": [1]})).find_bottom(), None);
    }

    #[test]
    fn annotates_patch_keys_in_place() {
        let mut document = Node::from_json(&json!({"env": [{"name": "A"}]}));
        document.annotate_patch_key(&Path::field("env"), "name").expect("annotate list");
        assert!(matches!(document.field("env"), Some(Node::List(List { patch_key: Some(key), .. })) if key == "name"));

        let error = document
            .annotate_patch_key(&path("env[0].name"), "name")
            .expect_err("scalars cannot carry patch keys");
        assert!(matches!(error, DocumentError::TypeMismatch { .. }));
    }
}
