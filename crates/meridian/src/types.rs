//! Domain types for Meridian.
//!
//! These types represent the core domain model:
//! - **Analyzer output**: `FileFacts` and its parts (cached by content hash)
//! - **Graph entities**: `FileRecord`, `SymbolId`, `Location`
//! - **Results**: `IndexStats`, `IndexReport`, `UpdateReport`, `Impact`, `Cycle`
//!
//! ## Design Decisions
//!
//! | Decision | Choice | Rationale |
//! |----------|--------|-----------|
//! | Language | Enum not String | Adding a language requires an `Analyzer` impl |
//! | `FileFacts` | Path independent | Identical content shares one cache entry |
//! | `SymbolId` | Structural tuple | Same definition site means same symbol |
//! | Ordered sets | `BTreeSet` | Deterministic output, order-free equality |

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;
use crate::graph::ProjectGraph;

// ============================================================================
// Content hashing
// ============================================================================

/// Digest of a file's bytes, used for cache validity and change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub u64);

impl ContentHash {
    /// Hash raw file content with xxh3.
    #[must_use]
    pub fn of(content: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_64(content))
    }

    /// Extract the raw u64 value.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Languages with a bundled analyzer.
///
/// The indexer core never branches on this; it only selects the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Rust source files (`.rs`)
    Rust,
    /// TypeScript source files (`.ts`, `.mts`, `.cts`)
    TypeScript,
    /// TypeScript with JSX (`.tsx`)
    Tsx,
    /// JavaScript, parsed with the TSX grammar (`.js`, `.jsx`, `.mjs`, `.cjs`)
    JavaScript,
}

impl Language {
    /// All languages, in a stable order.
    pub const ALL: [Language; 4] = [
        Language::Rust,
        Language::TypeScript,
        Language::Tsx,
        Language::JavaScript,
    ];

    /// File extensions handled by this language.
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Rust => &["rs"],
            Self::TypeScript => &["ts", "mts", "cts"],
            Self::Tsx => &["tsx"],
            Self::JavaScript => &["js", "jsx", "mjs", "cjs"],
        }
    }

    /// Detect language from file extension.
    ///
    /// # Returns
    ///
    /// `None` if the extension is not recognized.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    /// Stable string representation (used in the cache database).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
        }
    }

    /// Parse the string representation produced by [`Language::as_str`].
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.as_str() == s)
    }
}

/// Symbol kinds, normalized across languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Free function (including arrow functions bound to a name)
    Function,
    /// Function associated with a type
    Method,
    /// Rust struct
    Struct,
    /// Class
    Class,
    /// Enum type
    Enum,
    /// Rust trait
    Trait,
    /// TypeScript interface
    Interface,
    /// Constant value
    Const,
    /// Static variable
    Static,
    /// Mutable top-level binding (`let`/`var`)
    Variable,
    /// Module or namespace
    Module,
    /// Type alias
    TypeAlias,
    /// Rust macro
    Macro,
}

impl SymbolKind {
    /// Stable string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Struct => "struct",
            Self::Class => "class",
            Self::Enum => "enum",
            Self::Trait => "trait",
            Self::Interface => "interface",
            Self::Const => "const",
            Self::Static => "static",
            Self::Variable => "variable",
            Self::Module => "module",
            Self::TypeAlias => "type_alias",
            Self::Macro => "macro",
        }
    }
}

/// Visibility levels, normalized across languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible everywhere (`pub` in Rust, `export` in TypeScript)
    Public,
    /// Visible within the crate (`pub(crate)`)
    Crate,
    /// Visible within the parent module (`pub(super)`, `pub(in path)`)
    Module,
    /// Visible only within the defining file or scope
    Private,
}

/// How a symbol is used at a reference site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Named import binding
    Import,
    /// Function or method call
    Call,
    /// Type annotation
    Type,
    /// Constructor call, struct literal, or JSX element
    Construct,
}

/// Structural role of a file within the project.
///
/// Used for the service/component counts exposed by [`GraphSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Backend or client service module
    Service,
    /// UI component
    Component,
    /// Test file
    Test,
    /// Anything else
    Module,
}

impl FileKind {
    /// Classify a project-relative path by naming convention.
    #[must_use]
    pub fn classify(path: &std::path::Path) -> Self {
        let in_dir = |name: &str| {
            path.parent().is_some_and(|parent| {
                parent
                    .components()
                    .any(|c| c.as_os_str().eq_ignore_ascii_case(name))
            })
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let stem = file_name.split('.').next().unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if in_dir("tests")
            || in_dir("__tests__")
            || file_name.contains(".test.")
            || file_name.contains(".spec.")
        {
            return Self::Test;
        }
        if in_dir("services")
            || stem.ends_with("Service")
            || stem.ends_with("_service")
            || file_name.contains(".service.")
        {
            return Self::Service;
        }
        let capitalised = stem.chars().next().is_some_and(char::is_uppercase);
        if in_dir("components") || (matches!(ext.as_str(), "tsx" | "jsx") && capitalised) {
            return Self::Component;
        }
        Self::Module
    }
}

// ============================================================================
// Analyzer output (cached, path independent)
// ============================================================================

/// A symbol definition as reported by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinedSymbol {
    /// Simple name (e.g., "save")
    pub name: String,
    /// What kind of symbol this is
    pub kind: SymbolKind,
    /// Line of the definition (1-indexed)
    pub line: u32,
    /// Column of the definition (1-indexed)
    pub column: u32,
    /// Visibility level
    pub visibility: Visibility,
    /// Enclosing type or namespace, if any (e.g., `IssueStorage` for a method)
    pub container: Option<String>,
}

/// A usage of a symbol by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolReference {
    /// Name of the referenced symbol
    pub name: String,
    /// How the symbol is used
    pub kind: ReferenceKind,
    /// Line of the usage (1-indexed)
    pub line: u32,
    /// Column of the usage (1-indexed)
    pub column: u32,
}

/// A file-level import as written in source.
///
/// The specifier is kept verbatim; analyzers turn it into candidate paths at
/// merge time via [`crate::Analyzer::import_candidates`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    /// Module specifier (e.g., `./auth` or `crate::storage`)
    pub specifier: String,
    /// Names bound by the import
    pub names: Vec<String>,
    /// Line of the import (1-indexed)
    pub line: u32,
}

/// An analyzer's output for one file.
///
/// Holds no path and no source text: it is a pure function of content, which
/// is what lets the content cache share entries between files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFacts {
    /// Symbols defined in the file
    pub symbols: Vec<DefinedSymbol>,
    /// Symbols referenced by the file
    pub references: Vec<SymbolReference>,
    /// File-level dependencies
    pub imports: Vec<ImportSpec>,
}

// ============================================================================
// Graph entities
// ============================================================================

/// Identity of a symbol definition.
///
/// Uniqueness is structural: two definitions with identical fields are the
/// same symbol. The same name may map to several ids (overloads,
/// redeclarations across files), so lookups always return a list.
///
/// Ordering is by name, then definition site, then kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId {
    /// Simple name
    pub name: String,
    /// Project-relative path of the defining file
    pub definition_path: PathBuf,
    /// Line of the definition (1-indexed)
    pub definition_line: u32,
    /// What kind of symbol this is
    pub kind: SymbolKind,
}

/// A place in the project where a symbol is used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Project-relative path
    pub path: PathBuf,
    /// Line (1-indexed)
    pub line: u32,
}

/// One indexed file.
///
/// A record exists in the graph iff the file existed (and was readable) at the
/// last scan that covered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Project-relative path (unique key)
    pub path: PathBuf,
    /// Digest of the bytes at last analysis
    pub content_hash: ContentHash,
    /// Analyzer selector
    pub language: Language,
    /// Structural role
    pub kind: FileKind,
    /// Symbols defined by this file, in source order
    pub symbols_defined: Vec<SymbolId>,
    /// Project files this file imports (resolved)
    pub depends_on: BTreeSet<PathBuf>,
    /// File size in bytes
    pub size_bytes: u64,
    /// When this file was last merged (diagnostics only)
    pub last_indexed_at: DateTime<Utc>,
}

impl FileRecord {
    /// Compare two records ignoring the diagnostic timestamp.
    #[must_use]
    pub fn same_contents(&self, other: &Self) -> bool {
        self.path == other.path
            && self.content_hash == other.content_hash
            && self.language == other.language
            && self.kind == other.kind
            && self.symbols_defined == other.symbols_defined
            && self.depends_on == other.depends_on
            && self.size_bytes == other.size_bytes
    }
}

// ============================================================================
// Operation Results
// ============================================================================

/// Statistics from a full index operation.
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    /// Files merged into the graph during this run
    pub files_indexed: usize,
    /// Files sent to an analyzer (cache misses)
    pub files_analyzed: usize,
    /// Files whose facts came from the content cache
    pub cache_hits: usize,
    /// Records dropped because their file is gone
    pub files_removed: usize,
    /// Total symbols defined in the graph after the run
    pub symbols_found: usize,
    /// Total reference locations in the graph after the run
    pub references_found: usize,
    /// How long the run took
    pub duration: Duration,
    /// Whether the run stopped early at a batch boundary
    pub cancelled: bool,
    /// Directories that could not be read
    pub directories_skipped: usize,
}

/// Result of [`crate::ProjectIndexer::index_project`].
#[derive(Debug, Clone)]
pub struct IndexReport {
    /// Snapshot of the graph after the run
    pub graph: Arc<ProjectGraph>,
    /// Counters
    pub stats: IndexStats,
    /// Per-file problems (non-fatal)
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of [`crate::ProjectIndexer::update_index`].
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    /// The invalidation set, sorted
    pub invalidated: Vec<PathBuf>,
    /// Files merged into the graph
    pub files_reindexed: usize,
    /// Files sent to an analyzer (cache misses)
    pub files_analyzed: usize,
    /// Files whose facts came from the content cache
    pub cache_hits: usize,
    /// Records dropped because their file is gone or no longer included
    pub files_removed: usize,
    /// How long the update took
    pub duration: Duration,
    /// Whether the update stopped early at a batch boundary
    pub cancelled: bool,
    /// Per-file problems (non-fatal)
    pub diagnostics: Vec<Diagnostic>,
}

/// Counts describing a graph, for diagnostics and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    /// Indexed files
    pub files: usize,
    /// Files classified as services
    pub services: usize,
    /// Files classified as components
    pub components: usize,
    /// Symbol definitions
    pub symbols: usize,
    /// Reference locations
    pub references: usize,
    /// Resolved file-to-file dependency edges
    pub dependency_edges: usize,
    /// When the graph last completed a merge
    pub last_indexed: Option<DateTime<Utc>>,
}

/// Result of file-level impact analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Impact {
    /// The file being analyzed
    pub target: PathBuf,
    /// Files that import the target directly
    pub direct_dependents: Vec<PathBuf>,
    /// Files that reach the target only through other files
    pub transitive_dependents: Vec<PathBuf>,
}

/// A circular dependency between files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    /// Files involved in the cycle, sorted
    pub files: Vec<PathBuf>,
}
