//! YAML values with span tracking.

use crate::Span;
use yaml_rust2::Yaml;

/// A YAML value together with its source span.
///
/// Wraps an owned `yaml-rust2::Yaml` with a parallel children structure so
/// that every element of a sequence and every entry of a mapping keeps its
/// own span. The `yaml` field is a complete, independent tree for callers
/// that do not need spans.
#[derive(Debug, Clone)]
pub struct SpannedYaml {
    /// The parsed value (owned, complete subtree).
    pub yaml: Yaml,
    /// Span of this node in the source text.
    pub span: Span,
    /// Span-tracked children, mirroring the shape of `yaml`.
    children: Children,
}

#[derive(Debug, Clone)]
enum Children {
    /// Scalars and null values have no children.
    None,
    /// Sequence elements.
    Array(Vec<SpannedYaml>),
    /// Mapping entries.
    Hash(Vec<HashEntry>),
}

/// A key-value pair of a YAML mapping, with separate spans for the key, the
/// value, and the whole entry.
#[derive(Debug, Clone)]
pub struct HashEntry {
    pub key: SpannedYaml,
    pub value: SpannedYaml,
    /// Span of just the key.
    pub key_span: Span,
    /// Span of just the value.
    pub value_span: Span,
    /// Span from the key's start to the value's end.
    pub entry_span: Span,
}

impl SpannedYaml {
    /// Create a scalar (leaf) node.
    pub fn new_scalar(yaml: Yaml, span: Span) -> Self {
        Self {
            yaml,
            span,
            children: Children::None,
        }
    }

    /// Create a sequence node.
    pub fn new_array(yaml: Yaml, span: Span, items: Vec<SpannedYaml>) -> Self {
        Self {
            yaml,
            span,
            children: Children::Array(items),
        }
    }

    /// Create a mapping node.
    pub fn new_hash(yaml: Yaml, span: Span, entries: Vec<HashEntry>) -> Self {
        Self {
            yaml,
            span,
            children: Children::Hash(entries),
        }
    }

    /// Check if this is a scalar (has no children structure).
    pub fn is_scalar(&self) -> bool {
        matches!(self.children, Children::None)
    }

    /// Check if this is a sequence.
    pub fn is_array(&self) -> bool {
        matches!(self.children, Children::Array(_))
    }

    /// Check if this is a mapping.
    pub fn is_hash(&self) -> bool {
        matches!(self.children, Children::Hash(_))
    }

    /// Sequence elements, if this is a sequence.
    pub fn as_array(&self) -> Option<&[SpannedYaml]> {
        match &self.children {
            Children::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Mapping entries, if this is a mapping.
    pub fn as_hash(&self) -> Option<&[HashEntry]> {
        match &self.children {
            Children::Hash(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a mapping value by string key.
    pub fn get_hash_value(&self, key: &str) -> Option<&SpannedYaml> {
        match &self.children {
            Children::Hash(entries) => entries
                .iter()
                .find(|entry| entry.key.yaml.as_str() == Some(key))
                .map(|entry| &entry.value),
            _ => None,
        }
    }

    /// Number of children (sequence length or mapping entry count).
    pub fn len(&self) -> usize {
        match &self.children {
            Children::None => 0,
            Children::Array(items) => items.len(),
            Children::Hash(entries) => entries.len(),
        }
    }

    /// Check if this node has no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_has_no_children() {
        let node = SpannedYaml::new_scalar(Yaml::String("x".into()), Span::new(0, 1));
        assert!(node.is_scalar());
        assert!(!node.is_array());
        assert!(!node.is_hash());
        assert_eq!(node.len(), 0);
    }

    #[test]
    fn hash_lookup_by_key() {
        let key = SpannedYaml::new_scalar(Yaml::String("nodes".into()), Span::new(0, 5));
        let value = SpannedYaml::new_scalar(Yaml::Integer(1), Span::new(7, 8));
        let entry = HashEntry {
            key_span: key.span,
            value_span: value.span,
            entry_span: Span::new(0, 8),
            key,
            value,
        };
        let node = SpannedYaml::new_hash(Yaml::Null, Span::new(0, 8), vec![entry]);
        assert!(node.is_hash());
        assert_eq!(node.get_hash_value("nodes").unwrap().yaml.as_i64(), Some(1));
        assert!(node.get_hash_value("missing").is_none());
    }
}
