//! Language analyzers that turn source text into element inventories.
//!
//! Each supported language implements [`SourceAnalyzer`]. Analyzers never
//! fail for malformed input: an unparseable file degrades to an empty
//! element list with a logged warning, so one bad file cannot abort a
//! project scan.

mod java;
mod python;

use std::path::Path;

use once_cell::sync::Lazy;

pub use java::JavaAnalyzer;
pub use python::PythonAnalyzer;

use crate::model::Element;

/// Language-specific analyzer.
///
/// Implementations extract declared types, functions and fields from one
/// file's text. `include_private` is the effective filter flag for this
/// call; resolving a per-file override against the configured default is
/// the caller's job.
pub trait SourceAnalyzer: Send + Sync {
    /// Language identifier (e.g., "java", "python").
    fn language_id(&self) -> &'static str;

    /// File extensions this analyzer handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Extract all elements from a file's content.
    ///
    /// Returns an empty vec for empty input and for unrecoverable parse
    /// failures; it must not panic or return an error for bad input.
    fn analyze(&self, path: &Path, content: &str, include_private: bool) -> Vec<Element>;

    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}

static ANALYZERS: Lazy<Vec<Box<dyn SourceAnalyzer>>> = Lazy::new(|| {
    vec![
        Box::new(JavaAnalyzer::new()) as Box<dyn SourceAnalyzer>,
        Box::new(PythonAnalyzer::new()) as Box<dyn SourceAnalyzer>,
    ]
});

/// Look up the analyzer for a file extension (without dot).
pub fn analyzer_for_extension(ext: &str) -> Option<&'static dyn SourceAnalyzer> {
    ANALYZERS
        .iter()
        .find(|a| a.handles_extension(ext))
        .map(|a| a.as_ref())
}

/// All extensions with a registered analyzer.
pub fn supported_extensions() -> Vec<&'static str> {
    ANALYZERS
        .iter()
        .flat_map(|a| a.file_extensions().iter().copied())
        .collect()
}
