//! Language-specific analysis.
//!
//! Each supported language implements the [`Analyzer`] trait, which turns a
//! file's bytes into [`FileFacts`] and maps import specifiers to candidate
//! project paths. The indexer core never branches on language: it looks the
//! analyzer up in an [`AnalyzerRegistry`] and calls through the trait.
//!
//! ## Adding a New Language
//!
//! 1. Add the variant to `Language` in `types.rs`
//! 2. Create a new module (e.g., `python.rs`)
//! 3. Implement `Analyzer`
//! 4. Register it in `AnalyzerRegistry::with_defaults()`

pub mod rust;
pub mod typescript;

mod tree_sitter_utils;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::AnalysisError;
use crate::types::{FileFacts, FileKind, ImportSpec, Language};

pub use rust::RustAnalyzer;
pub use typescript::EcmaAnalyzer;

/// A per-language source analyzer.
///
/// Implementations must be pure: the same `(path, content)` always yields the
/// same facts, and no shared state is mutated. Analysis runs concurrently on
/// the worker pool.
pub trait Analyzer: Send + Sync {
    /// The language this analyzer handles.
    fn language(&self) -> Language;

    /// File extensions this analyzer claims.
    fn extensions(&self) -> &[&str] {
        self.language().extensions()
    }

    /// Version of the extraction logic.
    ///
    /// Bump it whenever the facts produced for the same content change, so
    /// persisted cache entries from older versions are never served.
    fn version(&self) -> u32;

    /// Extract symbols, references and imports from one file.
    ///
    /// # Errors
    ///
    /// Returns an `AnalysisError` when the file cannot be analyzed; the
    /// indexer records a diagnostic and keeps the file's previous record.
    fn analyze(&self, path: &Path, content: &[u8]) -> Result<FileFacts, AnalysisError>;

    /// Project-relative paths an import may refer to, most specific first.
    ///
    /// Returns an empty list for imports that leave the project (external
    /// packages, standard library).
    fn import_candidates(&self, from: &Path, import: &ImportSpec) -> Vec<PathBuf>;

    /// Structural role of a file (service, component, ...).
    fn classify(&self, path: &Path, _facts: &FileFacts) -> FileKind {
        FileKind::classify(path)
    }
}

/// Lookup table from language and extension to analyzer.
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    by_language: HashMap<Language, Arc<dyn Analyzer>>,
    by_extension: HashMap<String, Language>,
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut languages: Vec<_> = self.by_language.keys().map(Language::as_str).collect();
        languages.sort_unstable();
        f.debug_struct("AnalyzerRegistry")
            .field("languages", &languages)
            .finish()
    }
}

impl AnalyzerRegistry {
    /// An empty registry; nothing will be indexed until analyzers are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every bundled analyzer.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RustAnalyzer);
        registry.register(EcmaAnalyzer::typescript());
        registry.register(EcmaAnalyzer::tsx());
        registry.register(EcmaAnalyzer::javascript());
        registry
    }

    /// Add an analyzer, replacing any previous one for the same language.
    pub fn register(&mut self, analyzer: impl Analyzer + 'static) {
        let language = analyzer.language();
        self.by_extension.retain(|_, lang| *lang != language);
        for ext in analyzer.extensions() {
            self.by_extension.insert(ext.to_lowercase(), language);
        }
        self.by_language.insert(language, Arc::new(analyzer));
    }

    /// The analyzer registered for a language.
    #[must_use]
    pub fn get(&self, language: Language) -> Option<&dyn Analyzer> {
        self.by_language.get(&language).map(AsRef::as_ref)
    }

    /// The language whose analyzer claims this path's extension.
    #[must_use]
    pub fn language_for(&self, path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.by_extension.get(&ext).copied()
    }

    /// Whether some analyzer claims this path.
    #[must_use]
    pub fn supports(&self, path: &Path) -> bool {
        self.language_for(path).is_some()
    }
}
