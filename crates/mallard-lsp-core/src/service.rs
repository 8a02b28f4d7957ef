//! The language service facade the host layer drives.

use crate::completion;
use crate::document::Document;
use crate::schema::SchemaCatalog;
use crate::settings::LanguageSettings;
use crate::types::{CompletionItem, CompletionTrigger, Diagnostic, Position};
use crate::validation;

/// Owns the schema catalog and the effective settings; all request handling
/// is pure and synchronous over the passed document snapshot.
#[derive(Debug)]
pub struct LanguageService {
    /// Language identifier, used as the diagnostic source.
    id: String,
    settings: LanguageSettings,
    catalog: SchemaCatalog,
}

impl LanguageService {
    /// Create an unconfigured service: empty catalog, everything disabled.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            settings: LanguageSettings::default(),
            catalog: SchemaCatalog::default(),
        }
    }

    /// Apply new settings: rebuilds the schema catalog (an atomic full
    /// replacement) and stores the toggles.
    pub fn configure(&mut self, settings: LanguageSettings) {
        self.catalog = SchemaCatalog::build(&settings);
        self.settings = settings;
    }

    /// The effective settings.
    pub fn settings(&self) -> &LanguageSettings {
        &self.settings
    }

    /// Validate a pipeline document into an ordered diagnostic list.
    pub fn do_validation(&self, document: &Document) -> Vec<Diagnostic> {
        validation::validate(document, &self.catalog, &self.settings, &self.id)
    }

    /// Compute completions for the cursor position and trigger.
    pub fn do_completion(
        &self,
        document: &Document,
        position: Position,
        trigger: CompletionTrigger,
    ) -> Vec<CompletionItem> {
        completion::complete(document, position, trigger, &self.catalog, &self.settings)
    }

    /// Fill in an offered item's detail text.
    pub fn do_completion_resolve(&self, item: CompletionItem) -> CompletionItem {
        completion::resolve(item)
    }
}
