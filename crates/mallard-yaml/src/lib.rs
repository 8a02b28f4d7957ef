//! # mallard-yaml
//!
//! YAML parsing with character-offset span tracking.
//!
//! This crate provides [`SpannedYaml`], which wraps `yaml-rust2::Yaml` with a
//! half-open character-offset span for every node in the YAML tree. Mapping
//! entries additionally track separate spans for their key and value, which
//! is what the pipeline grammar and the diagnostics layer anchor on.
//!
//! ## Design
//!
//! Uses the owned data approach: owned `Yaml` values with a parallel children
//! structure for span tracking. Line/column projection is deliberately absent
//! here; callers convert offsets at their output boundary.
//!
//! ## Example
//!
//! ```rust,no_run
//! let yaml = mallard_yaml::parse("nodes:\n  - input.visual\n").unwrap();
//! if let Some(nodes) = yaml.get_hash_value("nodes") {
//!     println!("nodes value starts at offset {}", nodes.span.start);
//! }
//! ```

mod error;
mod parser;
mod span;
mod spanned_yaml;

pub use error::{Error, Result};
pub use parser::parse;
pub use span::Span;
pub use spanned_yaml::{HashEntry, SpannedYaml};
