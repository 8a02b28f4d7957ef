//! Pipeline parser: converts a pipeline document's node list into an ordered
//! sequence of classified entries, preserving character-offset spans.
//!
//! The grammar is small and strict: a single top-level `nodes` key mapping to
//! a non-empty list, each list item either a bare dotted reference or a
//! single-key mapping from a reference to its config overrides. Violations
//! raise a positioned [`ParseError`]; everything inside an entry that merely
//! fails classification becomes a [`NodeEntry::NonNode`] for the validator to
//! report.

use std::collections::BTreeMap;

use mallard_yaml::{Span, SpannedYaml};
use yaml_rust2::Yaml;

use crate::document::Document;

/// Span used when no better position exists for a structural error.
pub(crate) const DEFAULT_SPAN: Span = Span { start: 0, end: 1 };

/// A pipeline grammar violation, fatal to the parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    /// Character-offset span the error anchors to.
    pub span: Span,
    /// Human-readable message, reported verbatim as a diagnostic.
    pub message: String,
}

impl ParseError {
    fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }

    fn default_span(message: impl Into<String>) -> Self {
        Self::new(DEFAULT_SPAN, message)
    }
}

/// A scalar captured from the document.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Str(String),
    Num(f64),
    /// The value was absent or of a shape the pipeline grammar ignores.
    Absent,
}

impl ScalarValue {
    /// The string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A parsed value plus the span it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedItem {
    pub value: ScalarValue,
    pub span: Span,
}

/// One classified entry of the pipeline's node list.
///
/// Exactly one shape per entry, by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEntry {
    /// A bare node reference, e.g. `- input.visual`.
    NodeString(ParsedItem),
    /// A node reference with config overrides, e.g. `- model.yolo: {...}`.
    NodeMap {
        /// The reference (the mapping's single key).
        node: ParsedItem,
        /// First-level keys of the config mapping, in declaration order.
        configs: Vec<ParsedItem>,
    },
    /// Anything else found in the list.
    NonNode(ParsedItem),
}

impl NodeEntry {
    /// The node reference, if this entry has one.
    pub fn reference(&self) -> Option<&ParsedItem> {
        match self {
            NodeEntry::NodeString(item) | NodeEntry::NodeMap { node: item, .. } => Some(item),
            NodeEntry::NonNode(_) => None,
        }
    }
}

/// An ordered pipeline of classified entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    pub nodes: Vec<NodeEntry>,
}

/// Parse the document into a pipeline.
///
/// With `omit_line` set, that line is space-filled before parsing (same
/// character count, no offset shifts elsewhere) so completion can analyze a
/// document whose current line is mid-edit.
pub fn parse(document: &Document, omit_line: Option<u32>) -> Result<Pipeline, ParseError> {
    let text = match omit_line {
        Some(line) => document.content_with_line_blanked(line),
        None => document.content().to_string(),
    };
    let root = mallard_yaml::parse(&text).map_err(|err| match err {
        mallard_yaml::Error::Scan { message, span } => ParseError::new(span, message),
        mallard_yaml::Error::EmptyStream => {
            ParseError::default_span("Top level 'nodes' key not found")
        }
    })?;

    let mut nodes = Vec::new();
    for entry in pipeline_entries(&root)? {
        nodes.push(classify_entry(entry)?);
    }
    Ok(Pipeline { nodes })
}

/// Map each entry's starting line (zero-based) to the entry itself.
///
/// Only entries with a node reference appear; completion walks this map
/// backward from the cursor line to find the nearest enclosing definition.
pub fn parse_node_def_map(
    document: &Document,
    omit_line: u32,
) -> Result<BTreeMap<u32, NodeEntry>, ParseError> {
    let pipeline = parse(document, Some(omit_line))?;
    let index = document.line_index();

    let mut map = BTreeMap::new();
    for entry in pipeline.nodes {
        if let Some(reference) = entry.reference() {
            let line = index.position_at(reference.span.start).line;
            map.insert(line, entry);
        }
    }
    Ok(map)
}

/// Check the top-level shape and return the node list's items.
fn pipeline_entries(root: &SpannedYaml) -> Result<&[SpannedYaml], ParseError> {
    let Some(entries) = root.as_hash() else {
        return Err(ParseError::default_span("Top level 'nodes' key not found"));
    };
    let Some(first) = entries.first() else {
        return Err(ParseError::default_span("Top level 'nodes' key not found"));
    };
    if first.key.yaml.as_str() != Some("nodes") {
        return Err(ParseError::default_span("Top level 'nodes' key not found"));
    }
    if entries.len() > 1 {
        return Err(ParseError::new(
            entries[1].key_span,
            "Pipeline should only contain a single top level 'nodes' key.",
        ));
    }
    match first.value.as_array() {
        Some(items) if !items.is_empty() => Ok(items),
        _ => Err(ParseError::new(
            first.key_span,
            "Pipeline does not contain a list of nodes.",
        )),
    }
}

/// Classify one list item, in priority order: node string, node map,
/// non-node.
fn classify_entry(entry: &SpannedYaml) -> Result<NodeEntry, ParseError> {
    if let Yaml::String(value) = &entry.yaml {
        if entry.is_scalar() {
            return Ok(NodeEntry::NodeString(ParsedItem {
                value: ScalarValue::Str(value.clone()),
                span: entry.span,
            }));
        }
    }

    if let Some(pairs) = entry.as_hash() {
        if pairs.len() > 1 {
            return Err(ParseError::new(
                pairs[1].key_span,
                "Each entry should only contain a single node.",
            ));
        }
        let Some(pair) = pairs.first() else {
            return Ok(NodeEntry::NonNode(ParsedItem {
                value: ScalarValue::Absent,
                span: entry.span,
            }));
        };
        if let Yaml::String(reference) = &pair.key.yaml {
            return Ok(NodeEntry::NodeMap {
                node: ParsedItem {
                    value: ScalarValue::Str(reference.clone()),
                    span: pair.key_span,
                },
                configs: config_keys(&pair.value)?,
            });
        }
        // A mapping keyed by something that is not a reference.
        return Ok(NodeEntry::NonNode(ParsedItem {
            value: scalar_value(&pair.key.yaml),
            span: pair.key_span,
        }));
    }

    Ok(NodeEntry::NonNode(ParsedItem {
        value: scalar_value(&entry.yaml),
        span: entry.span,
    }))
}

/// First-level keys of a node's config mapping. Nested values stay
/// unvalidated; only the keys and their spans matter.
fn config_keys(value: &SpannedYaml) -> Result<Vec<ParsedItem>, ParseError> {
    let Some(pairs) = value.as_hash() else {
        return Ok(Vec::new());
    };
    let mut configs = Vec::with_capacity(pairs.len());
    for pair in pairs {
        if pair.key.is_hash() {
            return Err(ParseError::default_span("Error parsing node entry."));
        }
        configs.push(ParsedItem {
            value: scalar_value(&pair.key.yaml),
            span: pair.key_span,
        });
    }
    Ok(configs)
}

fn scalar_value(yaml: &Yaml) -> ScalarValue {
    match yaml {
        Yaml::String(s) => ScalarValue::Str(s.clone()),
        Yaml::Integer(i) => ScalarValue::Num(*i as f64),
        Yaml::Real(r) => r
            .parse::<f64>()
            .map(ScalarValue::Num)
            .unwrap_or(ScalarValue::Absent),
        _ => ScalarValue::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> Document {
        Document::new("file:///pipeline.yml", content)
    }

    #[test]
    fn parses_entries_in_document_order() {
        let pipeline = parse(
            &doc("nodes:\n  - input.visual\n  - model.yolo\n  - output.screen\n"),
            None,
        )
        .unwrap();

        let refs: Vec<_> = pipeline
            .nodes
            .iter()
            .map(|entry| entry.reference().unwrap().value.as_str().unwrap())
            .collect();
        assert_eq!(refs, vec!["input.visual", "model.yolo", "output.screen"]);
    }

    #[test]
    fn parsing_is_idempotent() {
        let document = doc("nodes:\n  - model.yolo:\n      num_classes: 1\n  - 42\n");
        assert_eq!(parse(&document, None), parse(&document, None));
    }

    #[test]
    fn classifies_node_map_with_config_keys() {
        let pipeline = parse(
            &doc("nodes:\n  - model.yolo:\n      num_classes: 1\n      weights: null\n"),
            None,
        )
        .unwrap();

        let NodeEntry::NodeMap { node, configs } = &pipeline.nodes[0] else {
            panic!("expected node map, got {:?}", pipeline.nodes[0]);
        };
        assert_eq!(node.value.as_str(), Some("model.yolo"));
        let keys: Vec<_> = configs
            .iter()
            .map(|c| c.value.as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["num_classes", "weights"]);
    }

    #[test]
    fn node_map_without_configs_has_empty_config_list() {
        let pipeline = parse(&doc("nodes:\n  - model.yolo:\n"), None).unwrap();
        assert!(matches!(
            &pipeline.nodes[0],
            NodeEntry::NodeMap { configs, .. } if configs.is_empty()
        ));
    }

    #[test]
    fn classifies_non_node_entries() {
        let pipeline = parse(&doc("nodes:\n  - 42\n  - [a, b]\n"), None).unwrap();
        assert!(matches!(
            &pipeline.nodes[0],
            NodeEntry::NonNode(item) if item.value == ScalarValue::Num(42.0)
        ));
        assert!(matches!(
            &pipeline.nodes[1],
            NodeEntry::NonNode(item) if item.value == ScalarValue::Absent
        ));
    }

    #[test]
    fn non_string_map_key_is_non_node() {
        let pipeline = parse(&doc("nodes:\n  - 42: {}\n"), None).unwrap();
        assert!(matches!(&pipeline.nodes[0], NodeEntry::NonNode(_)));
    }

    #[test]
    fn missing_nodes_key_uses_default_span() {
        for content in ["", "other: 1\n", "plain scalar\n"] {
            let err = parse(&doc(content), None).unwrap_err();
            assert_eq!(err.message, "Top level 'nodes' key not found");
            assert_eq!(err.span, DEFAULT_SPAN);
        }
    }

    #[test]
    fn second_top_level_key_is_rejected_at_its_span() {
        let err = parse(&doc("nodes:\n  - a.b\nextra: 1\n"), None).unwrap_err();
        assert_eq!(
            err.message,
            "Pipeline should only contain a single top level 'nodes' key."
        );
        // "extra" starts at offset 15.
        assert_eq!(err.span, Span::new(15, 20));
    }

    #[test]
    fn nodes_must_be_a_non_empty_list() {
        for content in ["nodes:\n", "nodes: 5\n", "nodes: []\n"] {
            let err = parse(&doc(content), None).unwrap_err();
            assert_eq!(err.message, "Pipeline does not contain a list of nodes.");
            assert_eq!(err.span, Span::new(0, 5));
        }
    }

    #[test]
    fn multi_key_entry_is_rejected_at_second_key() {
        let err = parse(&doc("nodes:\n  - a.b: {}\n    c.d: {}\n"), None).unwrap_err();
        assert_eq!(err.message, "Each entry should only contain a single node.");
        // "c.d" starts at offset 23.
        assert_eq!(err.span, Span::new(23, 26));
    }

    #[test]
    fn malformed_yaml_propagates_scanner_position() {
        let err = parse(&doc("nodes:\n  - {unclosed\n"), None).unwrap_err();
        assert!(err.span.start > 0);
    }

    #[test]
    fn omit_line_recovers_a_broken_line() {
        let document = doc("nodes:\n  - {unclosed\n  - model.yolo\n");
        assert!(parse(&document, None).is_err());

        let pipeline = parse(&document, Some(1)).unwrap();
        // The blanked line is whitespace; only the surviving entry remains.
        assert_eq!(pipeline.nodes.len(), 1);
        assert!(matches!(&pipeline.nodes[0], NodeEntry::NodeString(item)
            if item.value.as_str() == Some("model.yolo")));
    }

    #[test]
    fn node_def_map_indexes_reference_lines() {
        let document = doc("nodes:\n  - input.visual\n  - model.yolo:\n      num_classes: 1\n");
        let map = parse_node_def_map(&document, 99).unwrap();

        assert_eq!(map.len(), 2);
        assert!(matches!(map.get(&1), Some(NodeEntry::NodeString(_))));
        assert!(matches!(map.get(&2), Some(NodeEntry::NodeMap { .. })));
        assert!(map.get(&3).is_none());
    }
}
