//! Conversion between mallard-lsp-core types and `tower_lsp::lsp_types`.

use tower_lsp::lsp_types::{
    CompletionContext, CompletionItem as LspCompletionItem,
    CompletionItemKind as LspCompletionItemKind, CompletionTriggerKind,
    Diagnostic as LspDiagnostic, DiagnosticSeverity as LspSeverity,
    InsertTextMode as LspInsertTextMode, Position as LspPosition, Range as LspRange,
};

use mallard_lsp_core::{
    CompletionItem, CompletionItemKind, CompletionTrigger, Diagnostic, DiagnosticSeverity,
    InsertTextMode, Position, Range,
};

/// Convert a core Position to an lsp-types Position.
pub fn position_to_lsp(pos: &Position) -> LspPosition {
    LspPosition {
        line: pos.line,
        character: pos.character,
    }
}

/// Convert an lsp-types Position to a core Position.
pub fn position_from_lsp(pos: &LspPosition) -> Position {
    Position::new(pos.line, pos.character)
}

/// Convert a core Range to an lsp-types Range.
pub fn range_to_lsp(range: &Range) -> LspRange {
    LspRange {
        start: position_to_lsp(&range.start),
        end: position_to_lsp(&range.end),
    }
}

/// Convert a core Diagnostic to an lsp-types Diagnostic.
pub fn diagnostic_to_lsp(diag: &Diagnostic) -> LspDiagnostic {
    LspDiagnostic {
        range: range_to_lsp(&diag.range),
        severity: Some(match diag.severity {
            DiagnosticSeverity::Error => LspSeverity::ERROR,
            DiagnosticSeverity::Warning => LspSeverity::WARNING,
            DiagnosticSeverity::Information => LspSeverity::INFORMATION,
            DiagnosticSeverity::Hint => LspSeverity::HINT,
        }),
        source: diag.source.clone(),
        message: diag.message.clone(),
        ..Default::default()
    }
}

/// Convert a core CompletionItem to an lsp-types CompletionItem.
///
/// The classification tag travels in the item's `data` field so it survives
/// the client round-trip for resolve.
pub fn completion_item_to_lsp(item: &CompletionItem) -> LspCompletionItem {
    LspCompletionItem {
        label: item.label.clone(),
        kind: Some(match item.kind {
            CompletionItemKind::Class => LspCompletionItemKind::CLASS,
            CompletionItemKind::Module => LspCompletionItemKind::MODULE,
            CompletionItemKind::TypeParameter => LspCompletionItemKind::TYPE_PARAMETER,
        }),
        detail: item.detail.clone(),
        insert_text: item.insert_text.clone(),
        insert_text_mode: item.insert_text_mode.map(|mode| match mode {
            InsertTextMode::AsIs => LspInsertTextMode::AS_IS,
            InsertTextMode::AdjustIndentation => LspInsertTextMode::ADJUST_INDENTATION,
        }),
        data: item
            .data
            .and_then(|data| serde_json::to_value(data).ok()),
        ..Default::default()
    }
}

/// Convert an lsp-types CompletionItem back into a core item (for resolve).
pub fn completion_item_from_lsp(item: &LspCompletionItem) -> CompletionItem {
    CompletionItem {
        label: item.label.clone(),
        kind: match item.kind {
            Some(LspCompletionItemKind::MODULE) => CompletionItemKind::Module,
            Some(LspCompletionItemKind::TYPE_PARAMETER) => CompletionItemKind::TypeParameter,
            _ => CompletionItemKind::Class,
        },
        data: item
            .data
            .clone()
            .and_then(|data| serde_json::from_value(data).ok()),
        detail: item.detail.clone(),
        insert_text: item.insert_text.clone(),
        insert_text_mode: item.insert_text_mode.map(|mode| match mode {
            LspInsertTextMode::AS_IS => InsertTextMode::AsIs,
            _ => InsertTextMode::AdjustIndentation,
        }),
    }
}

/// Derive the engine's trigger from the request context.
///
/// Returns `None` for trigger characters the server never registered.
pub fn trigger_from_context(context: Option<&CompletionContext>) -> Option<CompletionTrigger> {
    let Some(context) = context else {
        return Some(CompletionTrigger::Invoked);
    };
    match context.trigger_kind {
        CompletionTriggerKind::TRIGGER_CHARACTER => {
            match context.trigger_character.as_deref() {
                Some(" ") => Some(CompletionTrigger::Space),
                Some(".") => Some(CompletionTrigger::Period),
                Some(":") => Some(CompletionTrigger::Colon),
                _ => None,
            }
        }
        CompletionTriggerKind::INVOKED => Some(CompletionTrigger::Invoked),
        _ => None,
    }
}
