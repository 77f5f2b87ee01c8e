//! Patch-merge of resource documents.
//!
//! Merging works like unification with one difference: lists are patched
//! rather than unified. A list that has a patch key (from the patch's
//! annotation, the target's annotation, or a [`PatchKeyHints`] entry for its
//! path, in that order) is merged element-by-element by key value; other lists
//! merge positionally.

use indexmap::IndexMap;

use super::{DocumentError, List, Node, Path, Scalar, Segment, unify};

/// Out-of-band patch keys addressed by list path.
///
/// Paths may use `[*]` to match any list index, e.g. `spec.containers[*].env`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchKeyHints {
    entries: Vec<(Path, String)>,
}

impl PatchKeyHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds hints from `path -> key` text pairs, as found in configuration.
    pub fn from_patch_keys(patch_keys: &IndexMap<String, String>) -> Result<Self, DocumentError> {
        let mut hints = Self::new();
        for (path, key) in patch_keys {
            hints.insert(path.parse()?, key.clone());
        }
        Ok(hints)
    }

    pub fn insert(&mut self, path: Path, key: impl Into<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == path) {
            Some(entry) => entry.1 = key,
            None => self.entries.push((path, key)),
        }
    }

    pub fn with(mut self, path: Path, key: impl Into<String>) -> Self {
        self.insert(path, key);
        self
    }

    /// Returns the key configured for the list at `path`, if any.
    pub fn key_for(&self, path: &Path) -> Option<&str> {
        self.entries
            .iter()
            .find(|(pattern, _)| path.matches(pattern))
            .map(|(_, key)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Node {
    /// Merges `patch` into `self`, returning the merged tree.
    ///
    /// Structs merge field-by-field and scalars unify. Keyed lists match
    /// elements by the key field: matched elements merge recursively and the
    /// rest are appended, and the result is open when either input is. Other
    /// lists merge by position; patch elements beyond the target length are
    /// appended only when the target is open. `self` is never modified.
    pub fn merge(&self, patch: &Node, hints: &PatchKeyHints) -> Result<Node, DocumentError> {
        let mut path = Path::root();
        merge_at(self, patch, hints, &mut path)
    }
}

fn merge_at(target: &Node, patch: &Node, hints: &PatchKeyHints, path: &mut Path) -> Result<Node, DocumentError> {
    match (target, patch) {
        (Node::Bottom(conflict), _) | (_, Node::Bottom(conflict)) => Err(DocumentError::from_conflict(path, conflict)),
        (Node::Struct(target_fields), Node::Struct(patch_fields)) => {
            let mut merged = target_fields.clone();
            for (name, patch_field) in patch_fields.iter() {
                path.push(Segment::Field(name.clone()));
                let field = match target_fields.get(name) {
                    Some(target_field) => merge_at(target_field, patch_field, hints, path)?,
                    None => checked(patch_field, path)?,
                };
                path.pop();
                merged.insert(name.clone(), field);
            }
            Ok(Node::Struct(merged))
        }
        (Node::List(target_list), Node::List(patch_list)) => {
            let patch_key = patch_list
                .patch_key
                .as_deref()
                .or(target_list.patch_key.as_deref())
                .or_else(|| hints.key_for(path))
                .map(str::to_string);
            match patch_key {
                Some(key) => merge_keyed(target_list, patch_list, key, hints, path),
                None => merge_positional(target_list, patch_list, hints, path),
            }
        }
        _ => match unify(target, patch) {
            Node::Bottom(conflict) => Err(DocumentError::from_conflict(path, &conflict)),
            unified => Ok(unified),
        },
    }
}

fn merge_keyed(target: &List, patch: &List, key: String, hints: &PatchKeyHints, path: &mut Path) -> Result<Node, DocumentError> {
    let mut items = target.items.clone();
    for element in &patch.items {
        let matched = key_value(element, &key).and_then(|wanted| {
            items
                .iter()
                .position(|item| key_value(item, &key).is_some_and(|candidate| candidate.same_value(wanted)))
        });
        match matched {
            Some(index) => {
                path.push(Segment::Index(index));
                items[index] = merge_at(&items[index], element, hints, path)?;
                path.pop();
            }
            None => {
                path.push(Segment::Index(items.len()));
                items.push(checked(element, path)?);
                path.pop();
            }
        }
    }

    Ok(Node::List(List {
        items,
        open: target.open || patch.open,
        patch_key: Some(key),
    }))
}

fn merge_positional(target: &List, patch: &List, hints: &PatchKeyHints, path: &mut Path) -> Result<Node, DocumentError> {
    if patch.items.len() > target.items.len() && !target.open {
        return Err(DocumentError::Conflict {
            path: path.clone(),
            detail: format!(
                "patch has {} elements but the closed target list has {}",
                patch.items.len(),
                target.items.len()
            ),
        });
    }

    let mut items = Vec::with_capacity(target.items.len().max(patch.items.len()));
    for (index, target_item) in target.items.iter().enumerate() {
        match patch.items.get(index) {
            Some(patch_item) => {
                path.push(Segment::Index(index));
                items.push(merge_at(target_item, patch_item, hints, path)?);
                path.pop();
            }
            None => items.push(target_item.clone()),
        }
    }
    for (index, patch_item) in patch.items.iter().enumerate().skip(target.items.len()) {
        path.push(Segment::Index(index));
        items.push(checked(patch_item, path)?);
        path.pop();
    }

    Ok(Node::List(List {
        items,
        open: target.open,
        patch_key: None,
    }))
}

/// Copies a patch subtree that has no counterpart in the target.
fn checked(node: &Node, path: &Path) -> Result<Node, DocumentError> {
    match node.find_bottom() {
        Some(conflict) => Err(DocumentError::from_conflict(path, &conflict)),
        None => Ok(node.clone()),
    }
}

fn key_value<'a>(element: &'a Node, key: &str) -> Option<&'a Scalar> {
    match element.field(key)? {
        Node::Scalar(scalar) => Some(scalar),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Struct;
    use serde_json::json;

    fn path(text: &str) -> Path {
        text.parse().expect("valid path")
    }

    fn workload() -> Node {
        Node::from_json(&json!({
            "kind": "Pod",
            "spec": {"containers": [{
                "name": "main",
                "env": [{"name": "APP", "value": "nginx"}],
                "ports": [{"containerPort": 8080, "protocol": "TCP"}]
            }]}
        }))
    }

    #[test]
    fn keyed_lists_merge_matching_entries_and_append_new_ones() {
        let mut patch = Node::from_json(&json!({
            "spec": {"containers": [{"env": [
                {"name": "APP", "value": "nginx"},
                {"name": "ClusterIP", "value": "1.1.1.1"}
            ]}]}
        }));
        patch
            .annotate_patch_key(&path("spec.containers[0].env"), "name")
            .expect("annotate env");

        let merged = workload().merge(&patch, &PatchKeyHints::new()).expect("merge");
        let env = merged.lookup(&path("spec.containers[0].env")).expect("env");
        let Node::List(env) = env else { panic!("env must be a list") };
        assert_eq!(env.items.len(), 2);
        assert_eq!(env.patch_key.as_deref(), Some("name"));
        assert!(!env.open);
        assert_eq!(
            merged.lookup_string(&path("spec.containers[0].env[1].value")).expect("appended"),
            "1.1.1.1"
        );
        assert_eq!(
            merged.lookup(&path("spec.containers[0].ports[0].containerPort")).expect("untouched"),
            &Node::number(8080)
        );
    }

    #[test]
    fn keyed_merge_updates_fields_of_matched_entries() {
        let patch = Node::from_json(&json!({"spec": {"containers": [{"env": [{"name": "APP", "tier": "web"}]}]}}));
        let hints = PatchKeyHints::new().with(path("spec.containers[*].env"), "name");

        let merged = workload().merge(&patch, &hints).expect("merge");
        assert_eq!(merged.lookup_string(&path("spec.containers[0].env[0].tier")).expect("tier"), "web");
        assert_eq!(merged.lookup_string(&path("spec.containers[0].env[0].value")).expect("value"), "nginx");
    }

    #[test]
    fn keyed_merge_result_is_open_when_either_side_is() {
        let target = Node::from_json(&json!({"env": [{"name": "A"}]}));
        let patch = Node::Struct(
            [(
                "env".to_string(),
                Node::List(List::open(vec![Node::from_json(&json!({"name": "B"}))]).with_patch_key("name")),
            )]
            .into_iter()
            .collect(),
        );
        let merged = target.merge(&patch, &PatchKeyHints::new()).expect("merge");
        assert!(matches!(merged.field("env"), Some(Node::List(List { open: true, items, .. })) if items.len() == 2));
    }

    #[test]
    fn keyed_merge_conflicts_on_contradicting_fields() {
        let patch = Node::from_json(&json!({"spec": {"containers": [{"env": [{"name": "APP", "value": "apache"}]}]}}));
        let hints = PatchKeyHints::new().with(path("spec.containers[*].env"), "name");
        let error = workload().merge(&patch, &hints).expect_err("values conflict");
        assert_eq!(
            error,
            DocumentError::Conflict {
                path: path("spec.containers[0].env[0].value"),
                detail: "conflicting values \"nginx\" and \"apache\"".to_string(),
            }
        );
    }

    #[test]
    fn positional_merge_rejects_growing_closed_lists() {
        let patch = Node::from_json(&json!({"spec": {"containers": [{}, {"name": "sidecar"}]}}));
        let error = workload().merge(&patch, &PatchKeyHints::new()).expect_err("closed list");
        assert!(matches!(error, DocumentError::Conflict { .. }));

        let target = Node::List(List::open(vec![Node::number(1)]));
        let merged = target
            .merge(&Node::from_json(&json!([1, 2])), &PatchKeyHints::new())
            .expect("open target grows");
        assert!(matches!(merged, Node::List(List { open: true, ref items, .. }) if items.len() == 2));
    }

    #[test]
    fn positional_merge_keeps_trailing_target_elements() {
        let target = Node::from_json(&json!([{"a": 1}, {"b": 2}]));
        let merged = target
            .merge(&Node::from_json(&json!([{"c": 3}])), &PatchKeyHints::new())
            .expect("merge");
        assert_eq!(merged, Node::from_json(&json!([{"a": 1, "c": 3}, {"b": 2}])));
    }

    #[test]
    fn scalar_patch_against_struct_is_a_type_mismatch() {
        let error = workload()
            .merge(&Node::string("1.1.1.1"), &PatchKeyHints::new())
            .expect_err("scalar patch");
        assert!(matches!(error, DocumentError::TypeMismatch { .. }));
    }

    fn error_path(error: &DocumentError) -> Path {
        match error {
            DocumentError::Conflict { path, .. } => path.clone(),
            other => panic!("expected conflict, got {other}"),
        }
    }

    fn with_nested_bottom() -> Node {
        let mut nested = Struct::new();
        nested.insert("nested", Node::bottom("explicit bottom"));
        Node::Struct(nested)
    }

    #[test]
    fn bottoms_in_new_patch_fields_are_rejected() {
        let mut fields = Struct::new();
        fields.insert("extra", with_nested_bottom());
        let error = workload()
            .merge(&Node::Struct(fields), &PatchKeyHints::new())
            .expect_err("nested bottom");
        assert_eq!(error_path(&error), path("extra.nested"));
    }

    #[test]
    fn bottoms_in_appended_list_elements_are_rejected() {
        let keyed = Node::List(List::closed(vec![with_nested_bottom()]).with_patch_key("name"));
        let error = Node::List(List::closed(vec![]))
            .merge(&keyed, &PatchKeyHints::new())
            .expect_err("appended keyed element");
        assert_eq!(error_path(&error), path("[0].nested"));

        let positional = Node::List(List::closed(vec![Node::number(1), with_nested_bottom()]));
        let error = Node::List(List::open(vec![Node::number(1)]))
            .merge(&positional, &PatchKeyHints::new())
            .expect_err("appended positional element");
        assert_eq!(error_path(&error), path("[1].nested"));
    }

    #[test]
    fn hints_parse_from_configuration() {
        let mut patch_keys = IndexMap::new();
        patch_keys.insert("spec.containers[*].env".to_string(), "name".to_string());
        let hints = PatchKeyHints::from_patch_keys(&patch_keys).expect("parse hints");
        assert_eq!(hints.key_for(&path("spec.containers[3].env")), Some("name"));
        assert_eq!(hints.key_for(&path("spec.containers[3].ports")), None);
    }
}
