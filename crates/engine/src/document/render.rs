//! Canonical text rendering.
//!
//! Struct fields print sorted, one per line, indented with tabs. Open lists end
//! with `...`, and lists carrying a patch key are preceded by a
//! `// +patchKey=<key>` comment. Equal documents always render identically.

use std::fmt::{self, Display, Formatter};

use super::{List, Node, Scalar, Struct};

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Node::Struct(fields) => write_fields(f, fields, 0),
            other => write_value(f, other, 0),
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(text) => write!(f, "{}", serde_json::Value::String(text.clone())),
            Scalar::Number(number) => write!(f, "{number}"),
            Scalar::Bool(flag) => write!(f, "{flag}"),
            Scalar::Null => f.write_str("null"),
        }
    }
}

fn write_fields(f: &mut Formatter<'_>, fields: &Struct, depth: usize) -> fmt::Result {
    for (name, value) in fields.iter() {
        if let Node::List(List { patch_key: Some(key), .. }) = value {
            indent(f, depth)?;
            writeln!(f, "// +patchKey={key}")?;
        }
        indent(f, depth)?;
        write_label(f, name)?;
        f.write_str(": ")?;
        write_value(f, value, depth)?;
        f.write_str("\n")?;
    }
    Ok(())
}

fn write_value(f: &mut Formatter<'_>, node: &Node, depth: usize) -> fmt::Result {
    match node {
        Node::Scalar(scalar) => write!(f, "{scalar}"),
        Node::Constraint(kind) => write!(f, "{kind}"),
        Node::Bottom(_) => f.write_str("_|_"),
        Node::Struct(fields) if fields.is_empty() => f.write_str("{}"),
        Node::Struct(fields) => {
            f.write_str("{\n")?;
            write_fields(f, fields, depth + 1)?;
            indent(f, depth)?;
            f.write_str("}")
        }
        Node::List(list) => {
            f.write_str("[")?;
            for (index, item) in list.items.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write_value(f, item, depth)?;
            }
            if list.open {
                if !list.items.is_empty() {
                    f.write_str(", ")?;
                }
                f.write_str("...")?;
            }
            f.write_str("]")
        }
    }
}

fn write_label(f: &mut Formatter<'_>, name: &str) -> fmt::Result {
    let plain = name
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_' || first == '$')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if plain {
        f.write_str(name)
    } else {
        write!(f, "{}", serde_json::Value::String(name.to_string()))
    }
}

fn indent(f: &mut Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("\t")?;
    }
    Ok(())
}
