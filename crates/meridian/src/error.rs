//! Error types for Meridian operations.
//!
//! Errors come in two flavours:
//!
//! - **`Error`**: failures of a whole call (missing root, broken worker pool,
//!   unusable cache database). These are returned through `Result`.
//! - **`Diagnostic`**: per-file problems that are recorded and reported but
//!   never stop a scan.
//!
//! ## Error Philosophy
//!
//! Indexing is best effort:
//! - One unreadable or malformed file must not block the rest of the project
//! - Diagnostics are collected and handed back with the report
//! - Only a missing or unreadable project root is a hard failure of a scan
//!
//! ## Diagnostic Categorization
//!
//! `DiagnosticKind` uses a 4xx/5xx style split:
//! - Input problems (the project's fault): analyzer failures, bad encodings
//! - Internal problems (the environment's fault): I/O errors, cache corruption

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Meridian operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for Meridian operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The project root does not exist or could not be resolved
    #[error("project root not found: {0}")]
    RootNotFound(PathBuf),

    /// The project root exists but is not a readable directory
    #[error("project root is not a readable directory: {0}")]
    InvalidRoot(PathBuf),

    /// An incremental update was requested before any full index
    #[error("no project has been indexed yet")]
    NotIndexed,

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache database operation failed
    #[error("cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Cache payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal infrastructure failure (e.g., worker pool construction)
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// Failure reported by an analyzer for a single file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// File content is not valid UTF-8
    #[error("file is not valid UTF-8")]
    Encoding,

    /// The grammar could not be loaded into the parser
    #[error("grammar unavailable: {0}")]
    Grammar(String),

    /// The source could not be parsed at all
    #[error("parse failed: {0}")]
    Parse(String),
}

/// A non-fatal problem encountered while indexing a specific file.
///
/// Diagnostics are collected during a scan and returned in the report;
/// callers decide whether to surface them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Project-relative path of the file (or directory) concerned
    pub path: PathBuf,
    /// Category of the problem
    pub kind: DiagnosticKind,
    /// Human-readable message
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.path.display(),
            self.message,
            self.kind
        )
    }
}

impl std::error::Error for Diagnostic {}

/// Categorization of per-file diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    // === Input Problems (analogous to HTTP 4xx) ===
    /// The analyzer rejected the file; any prior record was kept
    AnalysisFailed,

    /// File content is not valid UTF-8
    EncodingError,

    /// No analyzer claims the file's extension
    UnsupportedLanguage,

    /// File exceeds the configured size limit
    FileTooLarge,

    /// Path given to an update lies outside the project root
    OutsideProject,

    // === Internal Problems (analogous to HTTP 5xx) ===
    /// File or directory could not be read
    UnreadablePath,

    /// A persisted cache entry was unreadable and treated as a miss
    CacheCorrupt,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnalysisFailed => write!(f, "analysis failed"),
            Self::EncodingError => write!(f, "encoding error"),
            Self::UnsupportedLanguage => write!(f, "unsupported language"),
            Self::FileTooLarge => write!(f, "file too large"),
            Self::OutsideProject => write!(f, "outside project"),
            Self::UnreadablePath => write!(f, "unreadable path"),
            Self::CacheCorrupt => write!(f, "cache corrupt"),
        }
    }
}

impl DiagnosticKind {
    /// Returns `true` if this is an input problem (4xx-style).
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::AnalysisFailed
                | Self::EncodingError
                | Self::UnsupportedLanguage
                | Self::FileTooLarge
                | Self::OutsideProject
        )
    }

    /// Returns `true` if this is an internal problem (5xx-style).
    #[must_use]
    pub fn is_internal_error(&self) -> bool {
        matches!(self, Self::UnreadablePath | Self::CacheCorrupt)
    }
}

impl Diagnostic {
    /// Create a new diagnostic.
    #[must_use]
    pub fn new(path: PathBuf, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    /// Create a diagnostic for an I/O failure on a path.
    #[must_use]
    pub fn unreadable(path: PathBuf, error: &std::io::Error) -> Self {
        Self::new(path, DiagnosticKind::UnreadablePath, error.to_string())
    }

    /// Create a diagnostic from an analyzer failure.
    #[must_use]
    pub fn analysis_failed(path: PathBuf, error: &AnalysisError) -> Self {
        let kind = match error {
            AnalysisError::Encoding => DiagnosticKind::EncodingError,
            AnalysisError::Grammar(_) | AnalysisError::Parse(_) => DiagnosticKind::AnalysisFailed,
        };
        Self::new(path, kind, error.to_string())
    }

    /// Create an unsupported language diagnostic.
    #[must_use]
    pub fn unsupported_language(path: PathBuf) -> Self {
        let ext = path
            .extension()
            .map_or_else(|| "none".to_string(), |e| e.to_string_lossy().to_string());
        Self::new(
            path,
            DiagnosticKind::UnsupportedLanguage,
            format!("unsupported extension: {ext}"),
        )
    }

    /// Create a diagnostic for a file over the size limit.
    #[must_use]
    pub fn too_large(path: PathBuf, size: u64, limit: u64) -> Self {
        Self::new(
            path,
            DiagnosticKind::FileTooLarge,
            format!("{size} bytes exceeds limit of {limit} bytes"),
        )
    }
}
