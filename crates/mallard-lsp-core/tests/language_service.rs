//! End-to-end tests for the language service facade: schema directories on
//! disk, configure, then validation and completion against the same catalog.

use std::fs;
use std::path::{Path, PathBuf};

use mallard_lsp_core::{
    CompletionTrigger, Document, LanguageService, LanguageSettings, NamespaceFlags,
    NamespacePaths, Position,
};

fn write_node(dir: &Path, node_type: &str, node_name: &str, body: &str) {
    let type_dir = dir.join(node_type);
    fs::create_dir_all(&type_dir).unwrap();
    fs::write(type_dir.join(format!("{node_name}.yml")), body).unwrap();
}

/// Lay out built-in and custom config directories and return their paths.
fn schema_fixture(root: &Path) -> (PathBuf, PathBuf) {
    let built_in = root.join("mallard").join("configs");
    write_node(
        &built_in,
        "input",
        "visual",
        "input: [\"none\"]\noutput: [\"img\"]\nsource: 0\n",
    );
    write_node(
        &built_in,
        "dabble",
        "fps",
        "input: [\"pipeline_end\"]\noutput: [\"fps\"]\nfps_log_display: true\nfps_log_freq: 100\ndampen_fps: true\n",
    );
    write_node(
        &built_in,
        "model",
        "yolo",
        "input: [\"img\"]\noutput: [\"bboxes\"]\nweights: {}\ninput_size: 416\nscore_threshold: 0.2\niou_threshold: 0.5\nmodel_nodes: {}\n",
    );

    let custom = root.join("custom_nodes").join("configs");
    write_node(
        &custom,
        "model",
        "my_model",
        "input: [\"img\"]\noutput: [\"bboxes\"]\nmodel_conf_1: 0.5\n",
    );
    (built_in, custom)
}

fn configured_service(built_in: &Path, custom: &Path) -> LanguageService {
    let mut service = LanguageService::new("mallard");
    service.configure(LanguageSettings {
        complete: NamespaceFlags::all(),
        validate: NamespaceFlags::all(),
        parse_schema: NamespaceFlags::all(),
        config_dir: NamespacePaths {
            built_in: built_in.to_path_buf(),
            custom: custom.to_path_buf(),
        },
        max_problems: 100,
    });
    service
}

#[test]
fn valid_pipeline_passes_validation() {
    let root = tempfile::tempdir().unwrap();
    let (built_in, custom) = schema_fixture(root.path());
    let service = configured_service(&built_in, &custom);

    let document = Document::new(
        "file:///pipeline.yml",
        "nodes:\n  - input.visual\n  - model.yolo:\n      score_threshold: 0.3\n  - custom_nodes.model.my_model\n  - dabble.fps\n",
    );
    assert!(service.do_validation(&document).is_empty());
}

#[test]
fn validator_and_completion_agree_on_references() {
    let root = tempfile::tempdir().unwrap();
    let (built_in, custom) = schema_fixture(root.path());
    let service = configured_service(&built_in, &custom);

    // The validator accepts exactly the names completion offers.
    let document = Document::new("file:///pipeline.yml", "nodes:\n  - model.\n");
    let offered = service.do_completion(&document, Position::new(1, 10), CompletionTrigger::Period);

    for item in &offered {
        let reference = format!("nodes:\n  - model.{}\n", item.label);
        let valid = Document::new("file:///check.yml", reference);
        assert!(
            service.do_validation(&valid).is_empty(),
            "offered {} but validation rejects it",
            item.label
        );
    }
}

#[test]
fn reserved_keys_are_neither_offered_nor_accepted() {
    let root = tempfile::tempdir().unwrap();
    let (built_in, custom) = schema_fixture(root.path());
    let service = configured_service(&built_in, &custom);

    // weights/model_nodes are loader-internal for built-in model.yolo.
    let document = Document::new(
        "file:///pipeline.yml",
        "nodes:\n  - model.yolo:\n      weights: {}\n",
    );
    let diagnostics = service.do_validation(&document);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "Invalid node config key.");

    let snippet_doc = Document::new("file:///pipeline.yml", "nodes:\n  - model.yolo:\n");
    let items = service.do_completion(
        &snippet_doc,
        Position::new(1, 15),
        CompletionTrigger::Colon,
    );
    assert_eq!(
        items[0].insert_text.as_deref(),
        Some("\n      score_threshold:\n      iou_threshold:")
    );
}

#[test]
fn reconfigure_fully_replaces_the_catalog() {
    let root = tempfile::tempdir().unwrap();
    let (built_in, custom) = schema_fixture(root.path());
    let mut service = configured_service(&built_in, &custom);

    let document = Document::new("file:///pipeline.yml", "nodes:\n  - dabble.fps\n");
    assert!(service.do_validation(&document).is_empty());

    // Point the built-in namespace at a directory that does not exist: the
    // old catalog must not linger.
    service.configure(LanguageSettings {
        complete: NamespaceFlags::all(),
        validate: NamespaceFlags::all(),
        parse_schema: NamespaceFlags::all(),
        config_dir: NamespacePaths {
            built_in: root.path().join("gone").join("configs"),
            custom: custom.clone(),
        },
        max_problems: 100,
    });

    let diagnostics = service.do_validation(&document);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message,
        "dabble is not a valid Mallard node type."
    );
}

#[test]
fn completion_resolve_round_trip() {
    let root = tempfile::tempdir().unwrap();
    let (built_in, custom) = schema_fixture(root.path());
    let service = configured_service(&built_in, &custom);

    let document = Document::new("file:///pipeline.yml", "nodes:\n  - \n");
    let items = service.do_completion(&document, Position::new(1, 4), CompletionTrigger::Space);
    assert_eq!(
        items.iter().map(|i| i.label.as_str()).collect::<Vec<_>>(),
        vec!["dabble", "input", "model", "custom_nodes"]
    );

    let resolved = service.do_completion_resolve(items[3].clone());
    assert_eq!(resolved.detail.as_deref(), Some("Custom nodes folder name"));
}
