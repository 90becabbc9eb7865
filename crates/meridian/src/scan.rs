//! File discovery and loading.
//!
//! Discovery walks the project tree once, applying the configured directory
//! rules and keeping only files some analyzer claims. Loading reads one file,
//! enforces the size limit and hashes its bytes.
//!
//! Neither step is fatal: unreadable directories and files become diagnostics.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::IndexerConfig;
use crate::error::Diagnostic;
use crate::languages::AnalyzerRegistry;
use crate::types::{ContentHash, Language};

/// Result of walking a project tree.
#[derive(Debug, Default)]
pub(crate) struct Discovery {
    /// Project-relative paths with their language, sorted by path
    pub files: Vec<(PathBuf, Language)>,
    pub diagnostics: Vec<Diagnostic>,
    pub directories_skipped: usize,
}

/// Enumerate indexable files under `root`.
///
/// Symlinks are not followed.
pub(crate) fn discover(
    root: &Path,
    config: &IndexerConfig,
    registry: &AnalyzerRegistry,
) -> Discovery {
    let mut discovery = Discovery::default();
    walk_dir(root, root, config, registry, &mut discovery);
    discovery.files.sort();
    debug!(
        root = %root.display(),
        files = discovery.files.len(),
        directories_skipped = discovery.directories_skipped,
        "Discovered source files"
    );
    discovery
}

fn walk_dir(
    root: &Path,
    dir: &Path,
    config: &IndexerConfig,
    registry: &AnalyzerRegistry,
    discovery: &mut Discovery,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(
                directory = %dir.display(),
                error = %e,
                "Cannot read directory, skipping"
            );
            discovery.directories_skipped += 1;
            discovery
                .diagnostics
                .push(Diagnostic::unreadable(relative_to(root, dir), &e));
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(
                    directory = %dir.display(),
                    error = %e,
                    "Failed to read directory entry, skipping"
                );
                discovery
                    .diagnostics
                    .push(Diagnostic::unreadable(relative_to(root, dir), &e));
                continue;
            }
        };

        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                discovery
                    .diagnostics
                    .push(Diagnostic::unreadable(relative_to(root, &path), &e));
                continue;
            }
        };

        if file_type.is_dir() {
            let skip = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| config.is_excluded_dir(name));
            if !skip {
                walk_dir(root, &path, config, registry, discovery);
            }
        } else if file_type.is_file() {
            let relative = relative_to(root, &path);
            if !config.admits(&relative) {
                continue;
            }
            if let Some(language) = registry.language_for(&relative) {
                discovery.files.push((relative, language));
            }
        }
    }
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

/// Whether discovery would list `relative`: admitted by the directory rules
/// and a regular file reached without crossing a symlink.
///
/// Extension filtering is left to the caller.
pub(crate) fn is_indexable_file(root: &Path, relative: &Path, config: &IndexerConfig) -> bool {
    config.admits(relative)
        && matches!(metadata_without_links(root, relative), Ok(Some(m)) if m.is_file())
}

/// Metadata for `relative` under `root`, or `None` when it or a directory on
/// the way is a symlink or not a directory.
fn metadata_without_links(
    root: &Path,
    relative: &Path,
) -> std::io::Result<Option<std::fs::Metadata>> {
    let mut current = root.to_path_buf();
    let mut metadata: Option<std::fs::Metadata> = None;
    for component in relative.components() {
        if metadata.as_ref().is_some_and(|m| !m.is_dir()) {
            return Ok(None);
        }
        current.push(component);
        let m = std::fs::symlink_metadata(&current)?;
        if m.file_type().is_symlink() {
            return Ok(None);
        }
        metadata = Some(m);
    }
    Ok(metadata)
}

/// Identity of a loaded file, without its bytes.
#[derive(Debug, Clone)]
pub(crate) struct FileMeta {
    pub path: PathBuf,
    pub language: Language,
    pub content_hash: ContentHash,
    pub size_bytes: u64,
}

/// A file read into memory, ready for analysis.
#[derive(Debug)]
pub(crate) struct LoadedFile {
    pub meta: FileMeta,
    pub content: Vec<u8>,
}

#[derive(Debug)]
pub(crate) enum LoadOutcome {
    Loaded(LoadedFile),
    /// The file no longer exists, or is no longer a regular file reached
    /// without symlinks
    Missing(PathBuf),
    /// The file exists but cannot be indexed; any prior record is kept
    Failed(Diagnostic),
}

/// Read and hash one project-relative file.
pub(crate) fn load_file(
    root: &Path,
    relative: &Path,
    language: Language,
    max_file_size: u64,
) -> LoadOutcome {
    let absolute = root.join(relative);

    let metadata = match metadata_without_links(root, relative) {
        Ok(Some(m)) if m.is_file() => m,
        Ok(_) => return LoadOutcome::Missing(relative.to_path_buf()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return LoadOutcome::Missing(relative.to_path_buf());
        }
        Err(e) => return LoadOutcome::Failed(Diagnostic::unreadable(relative.to_path_buf(), &e)),
    };

    if metadata.len() > max_file_size {
        debug!(path = %relative.display(), size = metadata.len(), "File too large, skipping");
        return LoadOutcome::Failed(Diagnostic::too_large(
            relative.to_path_buf(),
            metadata.len(),
            max_file_size,
        ));
    }

    let content = match std::fs::read(&absolute) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return LoadOutcome::Missing(relative.to_path_buf());
        }
        Err(e) => {
            warn!(path = %relative.display(), error = %e, "Cannot read file, skipping");
            return LoadOutcome::Failed(Diagnostic::unreadable(relative.to_path_buf(), &e));
        }
    };

    LoadOutcome::Loaded(LoadedFile {
        meta: FileMeta {
            path: relative.to_path_buf(),
            language,
            content_hash: ContentHash::of(&content),
            size_bytes: content.len() as u64,
        },
        content,
    })
}
