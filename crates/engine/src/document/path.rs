//! Path addressing for structured documents.
//!
//! A path is a list of segments written in dotted form with bracketed list
//! indexes, for example `spec.containers[0].env`. Patch-key hints may use the
//! `[*]` wildcard to match every element of a list.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::DocumentError;

/// A single step while descending a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Struct field name.
    Field(String),
    /// Zero-based list position.
    Index(usize),
    /// Any list position. Only meaningful when matching patch-key hints.
    Wildcard,
}

/// Ordered list of segments addressing a node inside a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Segment>);

impl Path {
    /// The empty path, addressing the document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Builds a single-field path.
    pub fn field(name: impl Into<String>) -> Self {
        Self(vec![Segment::Field(name.into())])
    }

    /// Builds a path made only of field names.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(|name| Segment::Field(name.into())).collect())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<Segment> {
        self.0.pop()
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    /// Returns a new path with `other` appended.
    pub fn join(&self, other: &Path) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Returns the first `length` segments as a new path.
    pub fn prefix(&self, length: usize) -> Self {
        Self(self.0[..length.min(self.0.len())].to_vec())
    }

    /// Returns true when `self` matches `pattern` segment by segment, where a
    /// wildcard in the pattern matches any list index.
    pub fn matches(&self, pattern: &Path) -> bool {
        self.0.len() == pattern.0.len()
            && self.0.iter().zip(&pattern.0).all(|(segment, expected)| match (segment, expected) {
                (Segment::Index(_), Segment::Wildcard) => true,
                (left, right) => left == right,
            })
    }

    pub fn contains_wildcard(&self) -> bool {
        self.0.iter().any(|segment| matches!(segment, Segment::Wildcard))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) if position == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Wildcard => f.write_str("[*]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = DocumentError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "." {
            return Ok(Path::root());
        }

        let mut segments = Vec::new();
        for part in trimmed.split('.') {
            if part.is_empty() {
                return Err(invalid_path(text, "empty path segment"));
            }
            let (name, mut brackets) = match part.find('[') {
                Some(position) => part.split_at(position),
                None => (part, ""),
            };
            if name.contains(']') {
                return Err(invalid_path(text, "unexpected ']'"));
            }
            if !name.is_empty() {
                segments.push(Segment::Field(name.to_string()));
            }

            while !brackets.is_empty() {
                let Some(rest) = brackets.strip_prefix('[') else {
                    return Err(invalid_path(text, "unexpected characters after ']'"));
                };
                let Some(close) = rest.find(']') else {
                    return Err(invalid_path(text, "unclosed '['"));
                };
                let inner = rest[..close].trim();
                let segment = if inner == "*" {
                    Segment::Wildcard
                } else {
                    inner
                        .parse::<usize>()
                        .map(Segment::Index)
                        .map_err(|_| invalid_path(text, &format!("'{inner}' is not a list index")))?
                };
                segments.push(segment);
                brackets = &rest[close + 1..];
            }
        }

        Ok(Path(segments))
    }
}

fn invalid_path(text: &str, reason: &str) -> DocumentError {
    DocumentError::InvalidPath {
        path: text.to_string(),
        reason: reason.to_string(),
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fields_indexes_and_wildcards() {
        let path: Path = "spec.containers[0].env".parse().expect("parse path");
        assert_eq!(
            path.segments(),
            &[
                Segment::Field("spec".into()),
                Segment::Field("containers".into()),
                Segment::Index(0),
                Segment::Field("env".into()),
            ]
        );

        let pattern: Path = "spec.containers[*].env".parse().expect("parse pattern");
        assert!(pattern.contains_wildcard());
        assert!(path.matches(&pattern));
        assert!(!pattern.matches(&path));
    }

    #[test]
    fn display_round_trips() {
        for text in ["clusterIP", "a.b[2][3].c", "spec.containers[*].env", "."] {
            let path: Path = text.parse().expect("parse path");
            assert_eq!(path.to_string(), text);
        }
        assert!(Path::root().is_root());
    }

    #[test]
    fn rejects_malformed_paths() {
        for text in ["a..b", "a[0", "a[x]", "a]b", "a[0]x"] {
            let error = text.parse::<Path>().expect_err("expected invalid path");
            assert!(matches!(error, DocumentError::InvalidPath { .. }), "{text}: {error}");
        }
    }

    #[test]
    fn numeric_field_names_stay_fields() {
        let path: Path = "ports.0".parse().expect("parse path");
        assert_eq!(path.segments()[1], Segment::Field("0".into()));
    }
}
