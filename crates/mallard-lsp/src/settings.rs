//! Editor configuration: the raw `mallard` section pulled from the client,
//! and its resolution into the engine's [`LanguageSettings`].
//!
//! Each configured root path is expected to contain a `configs`
//! subdirectory; a namespace is enabled only when that directory is
//! readable. Probe failures disable the namespace, they never error.

use std::path::Path;

use serde::Deserialize;

use mallard_lsp_core::{LanguageSettings, NamespaceFlags, NamespacePaths};

/// Subdirectory of each root that holds the node definition files.
const CONFIGS_DIR: &str = "configs";

fn default_max_problems() -> usize {
    100
}

/// The `mallard` configuration section as sent by the client.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSettings {
    /// Maximum number of problems reported per file.
    #[serde(default = "default_max_problems")]
    pub max_number_of_problems: usize,
    /// Root paths of the node libraries.
    pub path: RawPaths,
}

/// Root paths of the built-in package and the user's custom nodes.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPaths {
    /// Install root of the built-in node library.
    pub package: String,
    /// Root of the user's custom nodes folder.
    pub custom_nodes: String,
}

/// Resolve raw settings into effective language settings by probing the
/// config directories.
pub fn resolve(raw: &RawSettings) -> LanguageSettings {
    let built_in_dir = Path::new(&raw.path.package).join(CONFIGS_DIR);
    let custom_dir = Path::new(&raw.path.custom_nodes).join(CONFIGS_DIR);

    let flags = NamespaceFlags {
        built_in: readable_dir(&built_in_dir),
        custom: readable_dir(&custom_dir),
    };
    if !flags.built_in {
        tracing::info!(dir = %built_in_dir.display(), "built-in config directory not readable; namespace disabled");
    }
    if !flags.custom {
        tracing::info!(dir = %custom_dir.display(), "custom config directory not readable; namespace disabled");
    }

    LanguageSettings {
        complete: flags,
        validate: flags,
        parse_schema: flags,
        config_dir: NamespacePaths {
            built_in: built_in_dir,
            custom: custom_dir,
        },
        max_problems: raw.max_number_of_problems,
    }
}

fn readable_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok()
}
