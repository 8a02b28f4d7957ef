//! Event-driven parser that builds [`SpannedYaml`] trees.

use crate::{Error, HashEntry, Result, Span, SpannedYaml};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::Marker;
use yaml_rust2::Yaml;

/// Parse a single YAML document from a string, producing a span-tracked tree.
///
/// If the input contains multiple documents only the first one is kept.
///
/// # Errors
///
/// Returns [`Error::Scan`] when the input is not well-formed YAML (the span
/// points at the scanner's fault position) and [`Error::EmptyStream`] when
/// the input holds no document at all.
pub fn parse(content: &str) -> Result<SpannedYaml> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = TreeBuilder::default();

    // false = stop after the first document
    parser.load(&mut builder, false).map_err(Error::from)?;

    builder.root.ok_or(Error::EmptyStream)
}

/// Receiver that assembles the tree from marked scanner events.
#[derive(Default)]
struct TreeBuilder {
    /// Stack of collections currently being built.
    stack: Vec<OpenNode>,
    /// The completed root node.
    root: Option<SpannedYaml>,
}

enum OpenNode {
    Sequence {
        start: Marker,
        items: Vec<SpannedYaml>,
    },
    Mapping {
        start: Marker,
        // Value is None while the entry is waiting for it.
        entries: Vec<(SpannedYaml, Option<SpannedYaml>)>,
    },
}

impl TreeBuilder {
    fn push_complete(&mut self, node: SpannedYaml) {
        let Some(open) = self.stack.last_mut() else {
            self.root = Some(node);
            return;
        };
        match open {
            OpenNode::Sequence { items, .. } => items.push(node),
            OpenNode::Mapping { entries, .. } => match entries.last_mut() {
                Some((_, value @ None)) => *value = Some(node),
                _ => entries.push((node, None)),
            },
        }
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        match ev {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}

            Event::Scalar(value, _style, _anchor_id, _tag) => {
                let start = marker.index();
                let span = Span::new(start, start + value.chars().count());
                let node = SpannedYaml::new_scalar(scalar_to_yaml(&value), span);
                self.push_complete(node);
            }

            Event::SequenceStart(_anchor_id, _tag) => {
                self.stack.push(OpenNode::Sequence {
                    start: marker,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => {
                let Some(OpenNode::Sequence { start, items }) = self.stack.pop() else {
                    unreachable!("SequenceEnd without SequenceStart");
                };
                let span = Span::new(start.index(), marker.index().max(start.index()));
                let yaml = Yaml::Array(items.iter().map(|n| n.yaml.clone()).collect());
                self.push_complete(SpannedYaml::new_array(yaml, span, items));
            }

            Event::MappingStart(_anchor_id, _tag) => {
                self.stack.push(OpenNode::Mapping {
                    start: marker,
                    entries: Vec::new(),
                });
            }

            Event::MappingEnd => {
                let Some(OpenNode::Mapping { start, entries }) = self.stack.pop() else {
                    unreachable!("MappingEnd without MappingStart");
                };
                let span = Span::new(start.index(), marker.index().max(start.index()));

                let mut hash_entries = Vec::with_capacity(entries.len());
                let mut pairs = yaml_rust2::yaml::Hash::new();
                for (key, value) in entries {
                    // The scanner emits a null scalar for `key:` with no
                    // value, so every entry is complete by MappingEnd.
                    let Some(value) = value else { continue };
                    pairs.insert(key.yaml.clone(), value.yaml.clone());
                    let entry_span = Span::new(key.span.start, value.span.end.max(key.span.start));
                    hash_entries.push(HashEntry {
                        key_span: key.span,
                        value_span: value.span,
                        entry_span,
                        key,
                        value,
                    });
                }

                self.push_complete(SpannedYaml::new_hash(Yaml::Hash(pairs), span, hash_entries));
            }

            Event::Alias(_anchor_id) => {
                // Aliases are not resolved; stand in with a null scalar so
                // the surrounding structure keeps its shape.
                let start = marker.index();
                let node = SpannedYaml::new_scalar(Yaml::Null, Span::new(start, start));
                self.push_complete(node);
            }
        }
    }
}

/// Infer the scalar's type the way YAML 1.1 plain scalars resolve.
fn scalar_to_yaml(value: &str) -> Yaml {
    if let Ok(i) = value.parse::<i64>() {
        return Yaml::Integer(i);
    }
    if value.parse::<f64>().is_ok() {
        return Yaml::Real(value.to_string());
    }
    match value {
        "true" | "True" | "TRUE" => Yaml::Boolean(true),
        "false" | "False" | "FALSE" => Yaml::Boolean(false),
        "null" | "Null" | "NULL" | "~" | "" => Yaml::Null,
        _ => Yaml::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scalar() {
        let yaml = parse("hello").unwrap();
        assert!(yaml.is_scalar());
        assert_eq!(yaml.yaml.as_str(), Some("hello"));
        assert_eq!(yaml.span, Span::new(0, 5));
    }

    #[test]
    fn parse_typed_scalars() {
        assert_eq!(parse("42").unwrap().yaml.as_i64(), Some(42));
        assert_eq!(parse("true").unwrap().yaml.as_bool(), Some(true));
        assert!(parse("~").unwrap().yaml.is_null());
    }

    #[test]
    fn parse_sequence() {
        let yaml = parse("[a, b, c]").unwrap();
        assert!(yaml.is_array());
        let items = yaml.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].yaml.as_str(), Some("b"));
        assert_eq!(items[1].span, Span::new(4, 5));
    }

    #[test]
    fn parse_mapping_spans() {
        let yaml = parse("nodes:\n  - input.visual\n").unwrap();
        assert!(yaml.is_hash());

        let entry = &yaml.as_hash().unwrap()[0];
        assert_eq!(entry.key.yaml.as_str(), Some("nodes"));
        assert_eq!(entry.key_span, Span::new(0, 5));

        let items = entry.value.as_array().unwrap();
        assert_eq!(items[0].yaml.as_str(), Some("input.visual"));
        // "- " starts at offset 9, the reference itself at 11.
        assert_eq!(items[0].span, Span::new(11, 23));
    }

    #[test]
    fn parse_nested_mapping() {
        let yaml = parse("nodes:\n  - model.yolo:\n      num_classes: 1\n").unwrap();
        let nodes = yaml.get_hash_value("nodes").unwrap();
        let entry = nodes.as_array().unwrap()[0].as_hash().unwrap();
        assert_eq!(entry[0].key.yaml.as_str(), Some("model.yolo"));
        let configs = entry[0].value.as_hash().unwrap();
        assert_eq!(configs[0].key.yaml.as_str(), Some("num_classes"));
        assert_eq!(configs[0].value.yaml.as_i64(), Some(1));
    }

    #[test]
    fn parse_empty_value_is_null() {
        let yaml = parse("key:").unwrap();
        let entry = &yaml.as_hash().unwrap()[0];
        assert!(entry.value.yaml.is_null());
    }

    #[test]
    fn scan_error_carries_position() {
        let err = parse("nodes: [a, b\nkey: }").unwrap_err();
        match err {
            Error::Scan { span, .. } => assert!(span.start > 0),
            other => panic!("expected scan error, got {other:?}"),
        }
    }

    #[test]
    fn empty_stream() {
        assert_eq!(parse("").unwrap_err(), Error::EmptyStream);
    }
}
