//! Unification of document nodes.

use super::{Conflict, Kind, List, Node, Segment, Struct};

/// Combines two nodes into the most specific node consistent with both.
///
/// The function is total: contradictions produce [`Node::Bottom`] instead of an
/// error, with the conflict anchored at the deepest field or index where it was
/// found. Neither input is modified.
pub fn unify(left: &Node, right: &Node) -> Node {
    match (left, right) {
        (Node::Bottom(conflict), _) | (_, Node::Bottom(conflict)) => Node::Bottom(conflict.clone()),
        (Node::Constraint(Kind::Any), other) | (other, Node::Constraint(Kind::Any)) => checked(other),
        (Node::Constraint(left_kind), Node::Constraint(right_kind)) => {
            if left_kind == right_kind {
                Node::Constraint(*left_kind)
            } else {
                Node::Bottom(Conflict::type_mismatch(*left_kind, *right_kind))
            }
        }
        (Node::Constraint(kind), value) | (value, Node::Constraint(kind)) => {
            if value.kind() == *kind {
                checked(value)
            } else {
                Node::Bottom(Conflict::type_mismatch(*kind, value.kind()))
            }
        }
        (Node::Scalar(left_scalar), Node::Scalar(right_scalar)) => {
            if left_scalar.same_value(right_scalar) {
                left.clone()
            } else if left_scalar.kind() != right_scalar.kind() {
                Node::Bottom(Conflict::type_mismatch(left_scalar.kind(), right_scalar.kind()))
            } else {
                Node::Bottom(Conflict::value(format!("conflicting values {left} and {right}")))
            }
        }
        (Node::Struct(left_fields), Node::Struct(right_fields)) => unify_structs(left_fields, right_fields),
        (Node::List(left_list), Node::List(right_list)) => unify_lists(left_list, right_list),
        (left, right) => Node::Bottom(Conflict::type_mismatch(left.kind(), right.kind())),
    }
}

fn unify_structs(left: &Struct, right: &Struct) -> Node {
    let mut unified = left.clone();
    for (name, right_field) in right.iter() {
        let field = match left.get(name) {
            Some(left_field) => unify(left_field, right_field),
            None => checked(right_field),
        };
        if let Node::Bottom(conflict) = &field {
            return Node::Bottom(conflict.within(Segment::Field(name.clone())));
        }
        unified.insert(name.clone(), field);
    }
    Node::Struct(unified)
}

fn unify_lists(left: &List, right: &List) -> Node {
    let (shorter, longer) = if left.items.len() <= right.items.len() {
        (left, right)
    } else {
        (right, left)
    };
    if shorter.items.len() != longer.items.len() && !shorter.open {
        return Node::Bottom(Conflict::value(format!(
            "incompatible list lengths {} and {}",
            left.items.len(),
            right.items.len()
        )));
    }

    let mut items = Vec::with_capacity(longer.items.len());
    for (index, item) in longer.items.iter().enumerate() {
        let unified = match shorter.items.get(index) {
            Some(other) => unify(other, item),
            None => checked(item),
        };
        if let Node::Bottom(conflict) = &unified {
            return Node::Bottom(conflict.within(Segment::Index(index)));
        }
        items.push(unified);
    }

    Node::List(List {
        items,
        open: left.open && right.open,
        patch_key: left.patch_key.clone().or_else(|| right.patch_key.clone()),
    })
}

/// Copies `node`, collapsing it to bottom when it holds one anywhere.
fn checked(node: &Node) -> Node {
    match node.find_bottom() {
        Some(conflict) => Node::Bottom(conflict),
        None => node.clone(),
    }
}
