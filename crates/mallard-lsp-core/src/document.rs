//! Document abstraction for language analysis.
//!
//! Documents hold the live text buffer plus the character-offset to
//! line/character conversion the rest of the engine relies on. The engine
//! works in character offsets internally; [`LineIndex`] projects them to
//! positions at the output boundary. Nothing derived from the text is cached
//! across edits; the index is rebuilt from the current content on demand.

use crate::types::Position;

/// A document for language analysis.
#[derive(Debug, Clone)]
pub struct Document {
    /// The document's URI or path.
    uri: String,
    /// The document content.
    content: String,
    /// Version number for tracking changes (used by LSP).
    version: Option<i32>,
}

impl Document {
    /// Create a new document with the given URI and content.
    pub fn new(uri: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            content: content.into(),
            version: None,
        }
    }

    /// Create a new document with a version number.
    pub fn with_version(uri: impl Into<String>, content: impl Into<String>, version: i32) -> Self {
        Self {
            uri: uri.into(),
            content: content.into(),
            version: Some(version),
        }
    }

    /// The document's URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The document's content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The document's version, if set.
    pub fn version(&self) -> Option<i32> {
        self.version
    }

    /// Replace the content and bump the version.
    pub fn set_content_with_version(&mut self, content: impl Into<String>, version: i32) {
        self.content = content.into();
        self.version = Some(version);
    }

    /// Build the line index for the current content.
    pub fn line_index(&self) -> LineIndex<'_> {
        LineIndex::new(&self.content)
    }

    /// The content with one line space-filled: every character of `line`
    /// (excluding its newline) becomes a space, so the total character count
    /// and all offsets outside the line are preserved.
    ///
    /// Used by invoked completion to parse a document whose current line is
    /// mid-edit.
    pub fn content_with_line_blanked(&self, line: u32) -> String {
        let index = self.line_index();
        let Some((start_byte, end_byte)) = index.line_byte_bounds(line) else {
            return self.content.clone();
        };
        let blanked_chars = self.content[start_byte..end_byte].chars().count();
        let mut text = String::with_capacity(self.content.len());
        text.push_str(&self.content[..start_byte]);
        text.extend(std::iter::repeat_n(' ', blanked_chars));
        text.push_str(&self.content[end_byte..]);
        text
    }
}

/// Character-offset ⇄ line/character conversion over a text snapshot.
#[derive(Debug)]
pub struct LineIndex<'a> {
    text: &'a str,
    /// Per line: (character offset, byte offset) of the line start.
    lines: Vec<(usize, usize)>,
    /// Total character count of the text.
    total_chars: usize,
}

impl<'a> LineIndex<'a> {
    /// Build the index by scanning the text once.
    pub fn new(text: &'a str) -> Self {
        let mut lines = vec![(0, 0)];
        let mut char_offset = 0;
        for (byte_offset, ch) in text.char_indices() {
            char_offset += 1;
            if ch == '\n' {
                lines.push((char_offset, byte_offset + 1));
            }
        }
        Self {
            text,
            lines,
            total_chars: char_offset,
        }
    }

    /// Number of lines (at least one, even for empty text).
    pub fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    /// Convert a character offset to a position. Offsets past the end clamp
    /// to the final position.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.total_chars);
        let line = self
            .lines
            .partition_point(|&(char_start, _)| char_start <= offset)
            - 1;
        Position::new(line as u32, (offset - self.lines[line].0) as u32)
    }

    /// Convert a position to a character offset. Positions past the end of
    /// their line (or the document) clamp.
    pub fn offset_at(&self, position: Position) -> usize {
        let Some(&(char_start, _)) = self.lines.get(position.line as usize) else {
            return self.total_chars;
        };
        let line_len = self.line_char_len(position.line);
        char_start + (position.character as usize).min(line_len)
    }

    /// The text of a line, without its trailing newline.
    pub fn line_text(&self, line: u32) -> &'a str {
        match self.line_byte_bounds(line) {
            Some((start, end)) => &self.text[start..end],
            None => "",
        }
    }

    /// Character length of a line, excluding its newline.
    fn line_char_len(&self, line: u32) -> usize {
        let end_chars = match self.lines.get(line as usize + 1) {
            // Preceding line ends with '\n'; exclude it.
            Some(&(next_start, _)) => next_start - 1,
            None => self.total_chars,
        };
        end_chars.saturating_sub(self.lines[line as usize].0)
    }

    /// Byte bounds of a line's content, excluding its newline.
    fn line_byte_bounds(&self, line: u32) -> Option<(usize, usize)> {
        let &(_, start_byte) = self.lines.get(line as usize)?;
        let end_byte = match self.lines.get(line as usize + 1) {
            Some(&(_, next_byte)) => next_byte - 1,
            None => self.text.len(),
        };
        Some((start_byte, end_byte))
    }
}

/// An in-memory store for open documents, keyed by URI.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: std::collections::HashMap<String, Document>,
}

impl DocumentStore {
    /// Create a new empty document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open or replace a document in the store.
    pub fn open(&mut self, uri: impl Into<String>, content: impl Into<String>, version: i32) {
        let uri = uri.into();
        self.documents
            .insert(uri.clone(), Document::with_version(uri, content, version));
    }

    /// Update a document's content.
    pub fn change(&mut self, uri: &str, content: impl Into<String>, version: i32) {
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.set_content_with_version(content, version);
        }
    }

    /// Close a document (remove it from the store).
    pub fn close(&mut self, uri: &str) {
        self.documents.remove(uri);
    }

    /// Get a document by URI.
    pub fn get(&self, uri: &str) -> Option<&Document> {
        self.documents.get(uri)
    }

    /// All open document URIs.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(|s| s.as_str())
    }
}
