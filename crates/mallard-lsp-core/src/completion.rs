//! Completion engine: offers node types, node names, and config keys
//! consistent with the same schema catalog and the same reference-segment
//! grammar the validator enforces.
//!
//! Dispatch is keyed on the trigger and the dot-segment count of the text
//! before the cursor:
//!
//! | trigger | segments | offers                                        |
//! |---------|----------|-----------------------------------------------|
//! | space   | any      | built-in types + custom folder token          |
//! | period  | 1        | built-in names under the type, or custom types|
//! | period  | 2        | custom names under the type                   |
//! | colon   | 2 / 3    | config snippet (built-in / custom)            |
//! | invoked | 1 / 2 / 3| types / names / custom names, or config keys  |
//!
//! Every branch honors its own namespace toggle; disabling one namespace
//! never affects the other's offers within the same request.

use crate::document::{Document, LineIndex};
use crate::parser::{self, NodeEntry};
use crate::schema::{NamespaceSchema, SchemaCatalog};
use crate::settings::LanguageSettings;
use crate::types::{
    CompletionData, CompletionItem, CompletionItemKind, CompletionTrigger, InsertTextMode,
    Position,
};

/// Indentation used when the document gives no hint.
const DEFAULT_INDENT: &str = "  ";

/// Compute completions for the given cursor position and trigger.
pub fn complete(
    document: &Document,
    position: Position,
    trigger: CompletionTrigger,
    catalog: &SchemaCatalog,
    settings: &LanguageSettings,
) -> Vec<CompletionItem> {
    let index = document.line_index();
    match trigger {
        CompletionTrigger::Space => complete_space(&index, position, catalog, settings),
        CompletionTrigger::Period => complete_period(&index, position, catalog, settings),
        CompletionTrigger::Colon => complete_colon(document, &index, position, catalog, settings),
        CompletionTrigger::Invoked => complete_invoked(document, &index, position, catalog, settings),
    }
}

/// Fill in the item's detail text from its classification tag. Pure and
/// idempotent; items without a tag pass through untouched.
pub fn resolve(mut item: CompletionItem) -> CompletionItem {
    if let Some(data) = item.data {
        item.detail = Some(data.detail().to_string());
    }
    item
}

/// Space after a list-item dash: offer new node definitions.
fn complete_space(
    index: &LineIndex,
    position: Position,
    catalog: &SchemaCatalog,
    settings: &LanguageSettings,
) -> Vec<CompletionItem> {
    if preceding_char(index, position) != Some('-') {
        return Vec::new();
    }
    let mut items = Vec::new();
    if settings.complete.built_in {
        items.extend(type_items(&catalog.built_in, CompletionData::BuiltInType));
    }
    if settings.complete.custom {
        items.push(folder_item(&catalog.custom));
    }
    items
}

/// Period extending a reference: offer the next segment.
fn complete_period(
    index: &LineIndex,
    position: Position,
    catalog: &SchemaCatalog,
    settings: &LanguageSettings,
) -> Vec<CompletionItem> {
    let text = preceding_text(index, position);
    let trimmed = text.trim();
    if !trimmed.starts_with('-') {
        return Vec::new();
    }
    let segments: Vec<&str> = trimmed[1..].trim().split('.').collect();
    match segments.len() {
        1 => {
            let mut items = Vec::new();
            if settings.complete.built_in {
                items.extend(name_items(
                    &catalog.built_in,
                    segments[0],
                    CompletionData::BuiltInNode,
                ));
            }
            if settings.complete.custom && segments[0] == catalog.custom.name {
                items.extend(type_items(&catalog.custom, CompletionData::CustomType));
            }
            items
        }
        2 => {
            if !settings.complete.custom || segments[0] != catalog.custom.name {
                return Vec::new();
            }
            name_items(&catalog.custom, segments[1], CompletionData::CustomNode)
        }
        _ => Vec::new(),
    }
}

/// Colon closing a reference: offer all of the node's config keys as one
/// snippet, aligned under the reference.
fn complete_colon(
    document: &Document,
    index: &LineIndex,
    position: Position,
    catalog: &SchemaCatalog,
    settings: &LanguageSettings,
) -> Vec<CompletionItem> {
    let raw = preceding_text(index, position);
    let trimmed = raw.trim();
    if !trimmed.starts_with('-') {
        return Vec::new();
    }
    let node_def = trimmed[1..].trim();
    let segments: Vec<&str> = node_def.split('.').collect();

    // Align config keys under the reference's own column.
    let alignment = " ".repeat(raw.chars().count() - node_def.chars().count());
    let prefix = format!("\n{}{}", alignment, detect_indentation(document.content()));

    let snippet = match segments.len() {
        2 if settings.complete.built_in => config_snippet(
            &catalog.built_in,
            segments[0],
            segments[1],
            &prefix,
            CompletionData::BuiltInConfig,
        ),
        3 if settings.complete.custom && segments[0] == catalog.custom.name => config_snippet(
            &catalog.custom,
            segments[1],
            segments[2],
            &prefix,
            CompletionData::CustomConfig,
        ),
        _ => None,
    };
    snippet.into_iter().collect()
}

/// Manually invoked: re-parse with the cursor line blanked and offer
/// whatever fits the surrounding context.
fn complete_invoked(
    document: &Document,
    index: &LineIndex,
    position: Position,
    catalog: &SchemaCatalog,
    settings: &LanguageSettings,
) -> Vec<CompletionItem> {
    let raw = preceding_text(index, position);
    let trimmed = raw.trim();

    if trimmed.starts_with('-') {
        // The cursor line is itself a (partial) node definition.
        let segments: Vec<&str> = trimmed[1..].trim().split('.').collect();
        return match segments.len() {
            1 => {
                let mut items = Vec::new();
                if settings.complete.built_in {
                    items.extend(type_items(&catalog.built_in, CompletionData::BuiltInType));
                }
                if settings.complete.custom {
                    items.push(folder_item(&catalog.custom));
                }
                items
            }
            2 => {
                let mut items = Vec::new();
                if settings.complete.built_in {
                    items.extend(name_items(
                        &catalog.built_in,
                        segments[0],
                        CompletionData::BuiltInNode,
                    ));
                }
                if settings.complete.custom && segments[0] == catalog.custom.name {
                    items.extend(type_items(&catalog.custom, CompletionData::CustomType));
                }
                items
            }
            3 => {
                if !settings.complete.custom || segments[0] != catalog.custom.name {
                    return Vec::new();
                }
                name_items(&catalog.custom, segments[1], CompletionData::CustomNode)
            }
            _ => Vec::new(),
        };
    }

    // Inside a node's config block: offer the keys not yet declared, from
    // the nearest preceding definition.
    let Ok(def_map) = parser::parse_node_def_map(document, position.line) else {
        return Vec::new();
    };
    let Some((_, NodeEntry::NodeMap { node, configs })) =
        def_map.range(..=position.line).next_back()
    else {
        return Vec::new();
    };

    let reference = node.value.as_str().unwrap_or_default();
    let segments: Vec<&str> = reference.split('.').collect();
    let present: Vec<&str> = configs
        .iter()
        .filter_map(|config| config.value.as_str())
        .collect();

    match segments.len() {
        2 if settings.complete.built_in => config_items(
            &catalog.built_in,
            segments[0],
            segments[1],
            &present,
            CompletionData::BuiltInConfig,
        ),
        3 if settings.complete.custom => {
            if segments[0] != catalog.custom.name {
                return Vec::new();
            }
            config_items(
                &catalog.custom,
                segments[1],
                segments[2],
                &present,
                CompletionData::CustomConfig,
            )
        }
        _ => Vec::new(),
    }
}

/// One item per node type in the namespace.
fn type_items(schema: &NamespaceSchema, data: CompletionData) -> Vec<CompletionItem> {
    schema
        .types()
        .map(|node_type| CompletionItem::new(node_type, CompletionItemKind::TypeParameter, data))
        .collect()
}

/// One item per node name under the type.
fn name_items(
    schema: &NamespaceSchema,
    node_type: &str,
    data: CompletionData,
) -> Vec<CompletionItem> {
    schema
        .names(node_type)
        .map(|node_name| CompletionItem::new(node_name, CompletionItemKind::Class, data))
        .collect()
}

/// The custom namespace's folder token.
fn folder_item(schema: &NamespaceSchema) -> CompletionItem {
    CompletionItem::new(
        &schema.name,
        CompletionItemKind::Module,
        CompletionData::CustomFolderName,
    )
}

/// One item per config key of the node not already declared.
fn config_items(
    schema: &NamespaceSchema,
    node_type: &str,
    node_name: &str,
    present: &[&str],
    data: CompletionData,
) -> Vec<CompletionItem> {
    let Some(node_schema) = schema.get(node_type, node_name) else {
        return Vec::new();
    };
    node_schema
        .configs
        .iter()
        .filter(|key| !present.contains(&key.as_str()))
        .map(|key| CompletionItem::new(key, CompletionItemKind::Class, data))
        .collect()
}

/// A single snippet item holding every config key of the node, one per line.
fn config_snippet(
    schema: &NamespaceSchema,
    node_type: &str,
    node_name: &str,
    prefix: &str,
    data: CompletionData,
) -> Option<CompletionItem> {
    let configs = &schema.get(node_type, node_name)?.configs;
    if configs.is_empty() {
        return None;
    }
    let insert_text = format!(
        "{prefix}{}:",
        configs.join(&format!(":{prefix}")),
    );
    Some(CompletionItem {
        label: "Configuration options".into(),
        kind: CompletionItemKind::TypeParameter,
        data: Some(data),
        detail: None,
        insert_text: Some(insert_text),
        insert_text_mode: Some(InsertTextMode::AsIs),
    })
}

/// The character just before the trigger character.
fn preceding_char(index: &LineIndex, position: Position) -> Option<char> {
    if position.character < 2 {
        return None;
    }
    index
        .line_text(position.line)
        .chars()
        .nth(position.character as usize - 2)
}

/// The line's text before the trigger character, untrimmed.
fn preceding_text(index: &LineIndex, position: Position) -> String {
    index
        .line_text(position.line)
        .chars()
        .take((position.character as usize).saturating_sub(1))
        .collect()
}

/// Detect the document's indentation unit: a tab when tab-indented,
/// otherwise the smallest indent step between consecutive lines, falling
/// back to two spaces.
fn detect_indentation(content: &str) -> String {
    let mut previous = 0usize;
    let mut step: Option<usize> = None;
    for line in content.lines() {
        if line.starts_with('\t') {
            return "\t".to_string();
        }
        if line.trim().is_empty() {
            continue;
        }
        let indent = line.chars().take_while(|c| *c == ' ').count();
        if indent > previous {
            let delta = indent - previous;
            step = Some(step.map_or(delta, |s| s.min(delta)));
        }
        previous = indent;
    }
    match step {
        Some(width) => " ".repeat(width),
        None => DEFAULT_INDENT.to_string(),
    }
}
