//! Schema catalog: the in-memory index of known node types, node names, and
//! their declarable config keys, per namespace.
//!
//! A namespace is built from a config directory laid out as
//! `<config_dir>/<node_type>/<node_name>.yml`, each file being a flat
//! key-value mapping. The `input`/`output` keys are ordered type-tag lists;
//! every other top-level key is a declarable config option. The custom
//! namespace additionally records the name of the config root's parent
//! directory: that token is the mandatory first segment of any custom node
//! reference.
//!
//! Rebuilds are atomic full replacements. A missing or unreadable directory,
//! or a malformed definition file, degrades the affected namespace to empty;
//! it is never surfaced as an error.

use std::collections::BTreeMap;
use std::path::Path;

use yaml_rust2::{Yaml, YamlLoader};

use crate::settings::LanguageSettings;

/// File extension of node definition files.
const CONFIG_EXT: &str = "yml";

/// Keys reserved for node I/O declarations, never declarable configs.
const IO_KEYS: [&str; 2] = ["input", "output"];

/// Loader-internal keys of specific built-in nodes. These appear in the
/// shipped definition files but are not user-declarable, so they are dropped
/// when building the built-in namespace.
const RESERVED_BUILT_IN: &[(&str, &str, &[&str])] = &[
    ("dabble", "tracking", &["optional_inputs"]),
    ("model", "csrnet", &["weights"]),
    (
        "model",
        "efficientdet",
        &["image_size", "model_nodes", "num_classes", "weights"],
    ),
    (
        "model",
        "fairmot",
        &["model_type", "optional_inputs", "weights"],
    ),
    (
        "model",
        "hrnet",
        &["model_nodes", "model_type", "resolution", "weights"],
    ),
    ("model", "jde", &["model_type", "optional_inputs", "weights"]),
    ("model", "movenet", &["weights"]),
    ("model", "mtcnn", &["model_nodes", "model_type", "weights"]),
    ("model", "posenet", &["model_nodes", "weights"]),
    (
        "model",
        "yolo",
        &["input_size", "model_nodes", "num_classes", "weights"],
    ),
    ("model", "yolo_face", &["input_size", "weights"]),
    ("model", "yolo_license_plate", &["input_size", "weights"]),
    ("model", "yolox", &["model_size", "num_classes", "weights"]),
];

/// Parsed schema of a single node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeSchema {
    /// Data types consumed by the node, in declaration order.
    pub input: Vec<String>,
    /// Data types produced by the node, in declaration order.
    pub output: Vec<String>,
    /// Declarable config keys, in declaration order.
    pub configs: Vec<String>,
}

/// One namespace of the catalog: node type → node name → schema.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamespaceSchema {
    /// Folder token required as the first reference segment (custom
    /// namespace only; empty for built-in).
    pub name: String,
    /// The two-level node index.
    pub nodes: BTreeMap<String, BTreeMap<String, NodeSchema>>,
}

impl NamespaceSchema {
    /// Look up a node's schema.
    pub fn get(&self, node_type: &str, node_name: &str) -> Option<&NodeSchema> {
        self.nodes.get(node_type)?.get(node_name)
    }

    /// Whether a node type exists in this namespace.
    pub fn has_type(&self, node_type: &str) -> bool {
        self.nodes.contains_key(node_type)
    }

    /// Node type names, in sorted order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Node names under a type, in sorted order.
    pub fn names(&self, node_type: &str) -> impl Iterator<Item = &str> {
        self.nodes
            .get(node_type)
            .into_iter()
            .flat_map(|names| names.keys().map(|s| s.as_str()))
    }
}

/// The full two-namespace catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaCatalog {
    pub built_in: NamespaceSchema,
    pub custom: NamespaceSchema,
}

impl SchemaCatalog {
    /// Build a fresh catalog from the settings. Always a full replacement of
    /// any prior state; namespaces whose `parse_schema` toggle is off stay
    /// empty.
    pub fn build(settings: &LanguageSettings) -> Self {
        let mut catalog = SchemaCatalog::default();
        if settings.parse_schema.built_in {
            catalog.built_in.nodes = scan_namespace(&settings.config_dir.built_in, true);
        }
        if settings.parse_schema.custom {
            catalog.custom.name = folder_token(&settings.config_dir.custom);
            catalog.custom.nodes = scan_namespace(&settings.config_dir.custom, false);
        }
        catalog
    }
}

/// The folder token of a custom config root: the file name of its parent
/// directory (e.g. `src/custom_nodes/configs` → `custom_nodes`).
fn folder_token(config_dir: &Path) -> String {
    config_dir
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Scan a config directory into the two-level node index. Any failure
/// degrades the namespace to empty.
fn scan_namespace(config_dir: &Path, built_in: bool) -> BTreeMap<String, BTreeMap<String, NodeSchema>> {
    match try_scan_namespace(config_dir, built_in) {
        Ok(nodes) => nodes,
        Err(err) => {
            tracing::warn!(dir = %config_dir.display(), error = %err, "schema scan failed; namespace left empty");
            BTreeMap::new()
        }
    }
}

fn try_scan_namespace(
    config_dir: &Path,
    built_in: bool,
) -> std::io::Result<BTreeMap<String, BTreeMap<String, NodeSchema>>> {
    let mut nodes = BTreeMap::new();
    for type_entry in std::fs::read_dir(config_dir)? {
        let type_entry = type_entry?;
        if !type_entry.file_type()?.is_dir() {
            continue;
        }
        let node_type = type_entry.file_name().to_string_lossy().into_owned();

        let mut names: BTreeMap<String, NodeSchema> = BTreeMap::new();
        for file_entry in std::fs::read_dir(type_entry.path())? {
            let path = file_entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(CONFIG_EXT) {
                continue;
            }
            let Some(node_name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let text = std::fs::read_to_string(&path)?;
            let schema = parse_node_def(&text, &node_type, node_name, built_in)
                .ok_or_else(|| std::io::Error::other(format!("malformed node definition {}", path.display())))?;
            names.insert(node_name.to_string(), schema);
        }
        // A type directory with no definition files does not become a type.
        if !names.is_empty() {
            nodes.insert(node_type, names);
        }
    }
    Ok(nodes)
}

/// Parse one node definition file: a flat mapping whose `input`/`output`
/// values are type-tag lists and whose remaining keys are config options.
fn parse_node_def(text: &str, node_type: &str, node_name: &str, built_in: bool) -> Option<NodeSchema> {
    let docs = YamlLoader::load_from_str(text).ok()?;
    let hash = match docs.first() {
        Some(Yaml::Hash(hash)) => hash,
        _ => return None,
    };

    let reserved: &[&str] = if built_in {
        RESERVED_BUILT_IN
            .iter()
            .find(|(t, n, _)| *t == node_type && *n == node_name)
            .map(|(_, _, keys)| *keys)
            .unwrap_or(&[])
    } else {
        &[]
    };

    let mut schema = NodeSchema::default();
    for (key, value) in hash {
        let Some(key) = key.as_str() else { continue };
        match key {
            "input" => schema.input = string_list(value),
            "output" => schema.output = string_list(value),
            _ if reserved.contains(&key) => {}
            _ => schema.configs.push(key.to_string()),
        }
    }
    Some(schema)
}

/// Collect a YAML value as a list of strings; anything else is empty.
fn string_list(value: &Yaml) -> Vec<String> {
    match value {
        Yaml::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
