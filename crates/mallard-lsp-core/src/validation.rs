//! Pipeline validation: matches parsed entries against the schema catalog
//! and emits ordered, capped diagnostics.
//!
//! The validator and the completion engine share one notion of a valid
//! reference: two segments address a built-in node (`type.name`), three
//! address a custom node (`folder.type.name`). Diagnostics accumulate in
//! strict entry order with character-offset spans; conversion to
//! line/character positions happens once, at the very end.

use mallard_yaml::Span;

use crate::document::Document;
use crate::parser::{self, NodeEntry, ParsedItem};
use crate::schema::{NamespaceSchema, SchemaCatalog};
use crate::settings::LanguageSettings;
use crate::types::{Diagnostic, DiagnosticSeverity, Range};

/// A diagnostic still in character-offset form.
struct SpanDiagnostic {
    span: Span,
    message: String,
}

impl SpanDiagnostic {
    fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// Outcome of checking a node reference.
enum RefCheck {
    /// Known node; config checks may proceed.
    Valid,
    /// Bad reference; carries its diagnostics and short-circuits the entry's
    /// config checks.
    Invalid(Vec<SpanDiagnostic>),
    /// The owning namespace's validate toggle is off; not checked at all.
    Skipped,
}

/// Validate a pipeline document.
///
/// Returns at most `max_problems` diagnostics, in document order, all with
/// severity Error and the given `source`. Empty when both validate toggles
/// are off.
pub fn validate(
    document: &Document,
    catalog: &SchemaCatalog,
    settings: &LanguageSettings,
    source: &str,
) -> Vec<Diagnostic> {
    if settings.validate.none_set() {
        return Vec::new();
    }
    tracing::debug!(uri = document.uri(), "validating pipeline document");

    let mut found: Vec<SpanDiagnostic> = Vec::new();
    match parser::parse(document, None) {
        Ok(pipeline) => {
            for entry in &pipeline.nodes {
                if found.len() >= settings.max_problems {
                    break;
                }
                match entry {
                    NodeEntry::NodeString(item) => {
                        if let RefCheck::Invalid(diags) = check_reference(item, catalog, settings) {
                            found.extend(diags);
                        }
                    }
                    NodeEntry::NodeMap { node, configs } => {
                        match check_reference(node, catalog, settings) {
                            RefCheck::Valid => {
                                found.extend(check_configs(node, configs, catalog));
                            }
                            RefCheck::Invalid(diags) => found.extend(diags),
                            RefCheck::Skipped => {}
                        }
                    }
                    NodeEntry::NonNode(item) => {
                        found.push(SpanDiagnostic::new(item.span, "Not a node."));
                    }
                }
            }
        }
        Err(err) => {
            // Structural error: exactly one diagnostic, analysis ends.
            found.push(SpanDiagnostic::new(err.span, err.message));
        }
    }
    found.truncate(settings.max_problems);

    let index = document.line_index();
    found
        .into_iter()
        .map(|diag| {
            Diagnostic::new(
                Range::new(
                    index.position_at(diag.span.start),
                    index.position_at(diag.span.end),
                ),
                DiagnosticSeverity::Error,
                diag.message,
            )
            .with_source(source)
        })
        .collect()
}

/// Check a node reference against the catalog, keyed by segment count.
fn check_reference(
    item: &ParsedItem,
    catalog: &SchemaCatalog,
    settings: &LanguageSettings,
) -> RefCheck {
    let reference = item.value.as_str().unwrap_or_default();
    let segments: Vec<&str> = reference.split('.').collect();
    match segments.len() {
        2 => {
            if !settings.validate.built_in {
                return RefCheck::Skipped;
            }
            check_built_in(&segments, item.span, &catalog.built_in)
        }
        3 => {
            if !settings.validate.custom {
                return RefCheck::Skipped;
            }
            check_custom(&segments, item.span, &catalog.custom)
        }
        _ => RefCheck::Invalid(vec![SpanDiagnostic::new(
            item.span,
            "Poorly formatted node definition.",
        )]),
    }
}

fn check_built_in(segments: &[&str], span: Span, schema: &NamespaceSchema) -> RefCheck {
    let (node_type, node_name) = (segments[0], segments[1]);
    if !schema.has_type(node_type) {
        let start = span.start;
        let end = start + node_type.chars().count();
        return RefCheck::Invalid(vec![SpanDiagnostic::new(
            Span::new(start, end),
            format!("{node_type} is not a valid Mallard node type."),
        )]);
    }
    if schema.get(node_type, node_name).is_none() {
        let end = span.end;
        let start = end - node_name.chars().count();
        return RefCheck::Invalid(vec![SpanDiagnostic::new(
            Span::new(start, end),
            format!("{node_name} is not a valid Mallard {node_type} node."),
        )]);
    }
    RefCheck::Valid
}

fn check_custom(segments: &[&str], span: Span, schema: &NamespaceSchema) -> RefCheck {
    let (folder, node_type, node_name) = (segments[0], segments[1], segments[2]);
    if folder != schema.name {
        let start = span.start;
        let end = start + folder.chars().count();
        return RefCheck::Invalid(vec![SpanDiagnostic::new(
            Span::new(start, end),
            format!("{folder} is not a valid custom nodes folder."),
        )]);
    }
    if !schema.has_type(node_type) {
        let start = span.start + folder.chars().count() + 1;
        let end = start + node_type.chars().count();
        return RefCheck::Invalid(vec![SpanDiagnostic::new(
            Span::new(start, end),
            format!("{node_type} is not a valid custom node type."),
        )]);
    }
    if schema.get(node_type, node_name).is_none() {
        let end = span.end;
        let start = end - node_name.chars().count();
        return RefCheck::Invalid(vec![SpanDiagnostic::new(
            Span::new(start, end),
            format!("{node_name} is not a valid custom {node_type} node."),
        )]);
    }
    RefCheck::Valid
}

/// Check a node map's declared config keys against the node's schema.
///
/// Only called for a reference already known to the catalog.
fn check_configs(
    node: &ParsedItem,
    configs: &[ParsedItem],
    catalog: &SchemaCatalog,
) -> Vec<SpanDiagnostic> {
    if configs.is_empty() {
        return vec![SpanDiagnostic::new(node.span, "Missing node configs.")];
    }

    let reference = node.value.as_str().unwrap_or_default();
    let segments: Vec<&str> = reference.split('.').collect();
    let (schema, node_type, node_name) = match segments.len() {
        2 => (&catalog.built_in, segments[0], segments[1]),
        3 => (&catalog.custom, segments[1], segments[2]),
        _ => return Vec::new(),
    };
    let known = schema
        .get(node_type, node_name)
        .map(|node_schema| node_schema.configs.as_slice())
        .unwrap_or_default();

    configs
        .iter()
        .filter(|config| {
            !config
                .value
                .as_str()
                .is_some_and(|key| known.iter().any(|k| k == key))
        })
        .map(|config| SpanDiagnostic::new(config.span, "Invalid node config key."))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NodeSchema;
    use crate::settings::NamespaceFlags;
    use crate::types::Position;
    use std::collections::BTreeMap;

    fn node_schema(configs: &[&str]) -> NodeSchema {
        NodeSchema {
            input: vec!["all".into()],
            output: vec!["none".into()],
            configs: configs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn namespace(name: &str, nodes: &[(&str, &str, &[&str])]) -> NamespaceSchema {
        let mut index: BTreeMap<String, BTreeMap<String, NodeSchema>> = BTreeMap::new();
        for (node_type, node_name, configs) in nodes {
            index
                .entry(node_type.to_string())
                .or_default()
                .insert(node_name.to_string(), node_schema(configs));
        }
        NamespaceSchema {
            name: name.into(),
            nodes: index,
        }
    }

    fn test_catalog() -> SchemaCatalog {
        SchemaCatalog {
            built_in: namespace(
                "",
                &[
                    ("dabble", "bbox_count", &[]),
                    (
                        "dabble",
                        "fps",
                        &["fps_log_display", "fps_log_freq", "dampen_fps"],
                    ),
                    ("model", "yolo", &["input_size", "num_classes"]),
                ],
            ),
            custom: namespace("custom_nodes", &[("model", "my_model", &["model_conf_1"])]),
        }
    }

    fn test_settings() -> LanguageSettings {
        LanguageSettings {
            validate: NamespaceFlags::all(),
            ..LanguageSettings::default()
        }
    }

    fn run(content: &str, settings: &LanguageSettings) -> Vec<Diagnostic> {
        let document = Document::new("file:///pipeline.yml", content);
        validate(&document, &test_catalog(), settings, "mallard")
    }

    #[test]
    fn valid_pipeline_yields_no_diagnostics() {
        let diagnostics = run(
            "nodes:\n  - dabble.fps\n  - model.yolo:\n      num_classes: 80\n  - custom_nodes.model.my_model\n",
            &test_settings(),
        );
        assert!(diagnostics.is_empty(), "got {diagnostics:?}");
    }

    #[test]
    fn missing_configs_reported_at_reference() {
        let diagnostics = run("nodes:\n  - model.yolo:\n", &test_settings());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Missing node configs.");
        assert_eq!(
            diagnostics[0].range,
            Range::new(Position::new(1, 4), Position::new(1, 14))
        );
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Error);
        assert_eq!(diagnostics[0].source.as_deref(), Some("mallard"));
    }

    #[test]
    fn invalid_config_key_reported_at_key() {
        let diagnostics = run(
            "nodes:\n  - model.yolo:\n      num_classes: 80\n      bogus_key: 1\n",
            &test_settings(),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Invalid node config key.");
        assert_eq!(
            diagnostics[0].range,
            Range::new(Position::new(3, 6), Position::new(3, 15))
        );
    }

    #[test]
    fn unknown_built_in_type_anchors_to_type_segment() {
        let diagnostics = run("nodes:\n  - foo.bar\n", &test_settings());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "foo is not a valid Mallard node type."
        );
        assert_eq!(
            diagnostics[0].range,
            Range::new(Position::new(1, 4), Position::new(1, 7))
        );
    }

    #[test]
    fn unknown_built_in_name_anchors_to_name_segment() {
        let diagnostics = run("nodes:\n  - model.nope\n", &test_settings());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "nope is not a valid Mallard model node."
        );
        assert_eq!(
            diagnostics[0].range,
            Range::new(Position::new(1, 10), Position::new(1, 14))
        );
    }

    #[test]
    fn custom_reference_checks_folder_then_type_then_name() {
        let folder = run("nodes:\n  - their_nodes.model.my_model\n", &test_settings());
        assert_eq!(
            folder[0].message,
            "their_nodes is not a valid custom nodes folder."
        );
        assert_eq!(
            folder[0].range,
            Range::new(Position::new(1, 4), Position::new(1, 15))
        );

        let node_type = run("nodes:\n  - custom_nodes.draw.my_model\n", &test_settings());
        assert_eq!(
            node_type[0].message,
            "draw is not a valid custom node type."
        );
        assert_eq!(
            node_type[0].range,
            Range::new(Position::new(1, 17), Position::new(1, 21))
        );

        let name = run("nodes:\n  - custom_nodes.model.nope\n", &test_settings());
        assert_eq!(name[0].message, "nope is not a valid custom model node.");
        assert_eq!(
            name[0].range,
            Range::new(Position::new(1, 23), Position::new(1, 27))
        );
    }

    #[test]
    fn wrong_segment_count_is_poorly_formatted() {
        let diagnostics = run("nodes:\n  - justone\n  - a.b.c.d\n", &test_settings());
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .all(|d| d.message == "Poorly formatted node definition."));
    }

    #[test]
    fn non_node_entries_are_flagged() {
        let diagnostics = run("nodes:\n  - 42\n", &test_settings());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Not a node.");
    }

    #[test]
    fn structural_error_is_single_verbatim_diagnostic() {
        let diagnostics = run("nodes:\n  - a.b\nextra: 1\n", &test_settings());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "Pipeline should only contain a single top level 'nodes' key."
        );
        assert_eq!(
            diagnostics[0].range,
            Range::new(Position::new(2, 0), Position::new(2, 5))
        );
    }

    #[test]
    fn max_problems_caps_in_document_order() {
        let mut settings = test_settings();
        settings.max_problems = 2;
        let diagnostics = run(
            "nodes:\n  - foo.a\n  - bar.b\n  - baz.c\n",
            &settings,
        );
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics[0].message,
            "foo is not a valid Mallard node type."
        );
        assert_eq!(
            diagnostics[1].message,
            "bar is not a valid Mallard node type."
        );
    }

    #[test]
    fn max_problems_never_exceeded_by_multi_diagnostic_entries() {
        let mut settings = test_settings();
        settings.max_problems = 2;
        // One entry carrying three bad config keys.
        let diagnostics = run(
            "nodes:\n  - model.yolo:\n      a: 1\n      b: 2\n      c: 3\n",
            &settings,
        );
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn disabling_custom_removes_only_custom_diagnostics() {
        let content =
            "nodes:\n  - foo.bar\n  - custom_nodes.draw.my_model\n  - 42\n";

        let both = run(content, &test_settings());
        assert_eq!(both.len(), 3);

        let mut settings = test_settings();
        settings.validate.custom = false;
        let built_in_only = run(content, &settings);
        assert_eq!(built_in_only.len(), 2);
        assert_eq!(
            built_in_only[0].message,
            "foo is not a valid Mallard node type."
        );
        assert_eq!(built_in_only[1].message, "Not a node.");
    }

    #[test]
    fn disabled_namespace_skips_config_checks_too() {
        let mut settings = test_settings();
        settings.validate.built_in = false;
        // Reference and config key are both wrong, but built-in is off.
        let diagnostics = run("nodes:\n  - model.yolo:\n      bogus: 1\n", &settings);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn both_toggles_off_yields_empty_result() {
        let mut settings = test_settings();
        settings.validate = NamespaceFlags::default();
        let diagnostics = run("nodes:\n  - garbage\n  - 42\n", &settings);
        assert!(diagnostics.is_empty());
    }
}
