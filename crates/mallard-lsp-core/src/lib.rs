//! Transport-agnostic language analysis for Mallard pipeline files.
//!
//! This crate implements the language tooling for the Mallard pipeline
//! description format without any LSP protocol dependencies: parsing the
//! document's node list into a strict domain model, validating node
//! references and config keys against the schema catalog, and serving
//! cursor-position-aware completions.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     mallard-lsp-core                       │
//! │  schema catalog · pipeline parser · validator · completion │
//! └────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │                       mallard-lsp                          │
//! │              (tower-lsp wrapper, stdio server)             │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use mallard_lsp_core::{Document, LanguageService, Position, CompletionTrigger};
//!
//! let mut service = LanguageService::new("mallard");
//! service.configure(settings);
//!
//! let doc = Document::new("file:///pipeline.yml", content);
//! let diagnostics = service.do_validation(&doc);
//! let items = service.do_completion(&doc, Position::new(2, 4), CompletionTrigger::Space);
//! ```

pub mod completion;
pub mod document;
pub mod parser;
pub mod schema;
pub mod service;
pub mod settings;
pub mod types;
pub mod validation;

pub use document::{Document, DocumentStore};
pub use mallard_yaml::Span;
pub use schema::{NamespaceSchema, NodeSchema, SchemaCatalog};
pub use service::LanguageService;
pub use settings::{LanguageSettings, NamespaceFlags, NamespacePaths};
pub use types::{
    CompletionData, CompletionItem, CompletionItemKind, CompletionTrigger, Diagnostic,
    DiagnosticSeverity, InsertTextMode, Position, Range,
};
