//! Core types for LSP-like functionality.
//!
//! These types are transport-agnostic and serialize cleanly to JSON, so the
//! engine can sit behind a native LSP server or any other host. Positions
//! use zero-based line and character indices, matching the LSP specification;
//! character-offset spans ([`mallard_yaml::Span`]) are projected into these
//! positions only at the output boundary.

use serde::{Deserialize, Serialize};

/// A position in a text document, as zero-based line and character offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    /// Zero-based line number.
    pub line: u32,
    /// Zero-based character offset within the line.
    pub character: u32,
}

impl Position {
    /// Create a new position.
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then(self.character.cmp(&other.character))
    }
}

/// A range in a text document: start inclusive, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a new range.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Diagnostic severity levels, matching LSP `DiagnosticSeverity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

/// A diagnostic message attached to a range of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The range at which the diagnostic applies.
    pub range: Range,
    /// The diagnostic's severity.
    pub severity: DiagnosticSeverity,
    /// A human-readable string describing the source of this diagnostic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// The diagnostic's message.
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(range: Range, severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            range,
            severity,
            source: None,
            message: message.into(),
        }
    }

    /// Set the diagnostic source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// The completion item kinds the engine emits, with LSP numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionItemKind {
    /// Node names and individual config keys.
    Class = 7,
    /// The custom nodes folder token.
    Module = 9,
    /// Node types and the config snippet item.
    TypeParameter = 25,
}

/// How the client should treat whitespace in an inserted snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsertTextMode {
    /// Insert the text exactly as written; the snippet carries its own
    /// alignment.
    AsIs = 1,
    /// Let the client adjust leading whitespace.
    AdjustIndentation = 2,
}

/// Opaque classification tag attached to offered items.
///
/// The resolve step derives the human-readable detail purely from this tag,
/// so it must survive the round-trip through the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionData {
    BuiltInType,
    BuiltInNode,
    BuiltInConfig,
    CustomFolderName,
    CustomType,
    CustomNode,
    CustomConfig,
}

impl CompletionData {
    /// The detail text shown for items carrying this tag.
    pub fn detail(&self) -> &'static str {
        match self {
            CompletionData::BuiltInType => "Built-in node type",
            CompletionData::BuiltInNode => "Built-in node",
            CompletionData::BuiltInConfig => "Built-in node config",
            CompletionData::CustomFolderName => "Custom nodes folder name",
            CompletionData::CustomType => "Custom node type",
            CompletionData::CustomNode => "Custom node",
            CompletionData::CustomConfig => "Custom node config",
        }
    }
}

/// A completion suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionItem {
    /// The label shown in the completion list.
    pub label: String,
    /// The kind of this item.
    pub kind: CompletionItemKind,
    /// Classification tag, used by resolve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CompletionData>,
    /// Human-readable detail, filled in by resolve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Text to insert instead of the label (config snippets).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
    /// Whitespace handling for `insert_text`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text_mode: Option<InsertTextMode>,
}

impl CompletionItem {
    /// Create a plain label item with a classification tag.
    pub fn new(label: impl Into<String>, kind: CompletionItemKind, data: CompletionData) -> Self {
        Self {
            label: label.into(),
            kind,
            data: Some(data),
            detail: None,
            insert_text: None,
            insert_text_mode: None,
        }
    }
}

/// What caused a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionTrigger {
    /// The space after a list-item dash.
    Space,
    /// A `.` extending a node reference.
    Period,
    /// A `:` closing a node reference that takes configs.
    Colon,
    /// Manually invoked, no trigger character.
    Invoked,
}
