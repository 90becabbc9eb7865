//! The in-memory project graph.
//!
//! `ProjectGraph` owns the file records plus three derived structures that are
//! kept consistent with them:
//!
//! - **Symbol index**: name → defining `SymbolId`s
//! - **Reference index**: name → `(path, line)` use sites
//! - **Dependency graph**: resolved file → file import edges and the watch
//!   index used for invalidation
//!
//! ## Update Discipline
//!
//! Every mutation is per file and replace-not-merge: [`ProjectGraph::upsert`]
//! removes everything the file contributed before adding its new facts, and
//! [`ProjectGraph::remove_file`] removes it all without replacement. Nothing
//! in the graph holds source text.
//!
//! The graph is only mutated by the index builder, one batch at a time, behind
//! an `Arc` (see `crate::builder`). Callers only ever see complete snapshots.

mod deps;
mod index;
mod query;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::types::{FileKind, FileRecord, GraphSummary};
use deps::DependencyGraph;
use index::{ReferenceIndex, SymbolIndex};

/// Everything the builder needs to (re)insert one file.
#[derive(Debug, Clone)]
pub(crate) struct MergeEntry {
    pub record: FileRecord,
    /// Referenced name → lines it is used on
    pub reference_lines: BTreeMap<String, BTreeSet<u32>>,
    /// Every candidate path the file's imports could resolve to
    pub watched: BTreeSet<PathBuf>,
}

/// Structural index of a project.
///
/// Obtain one through [`crate::ProjectIndexer::project_graph`]. A graph handed
/// out that way is an immutable snapshot: later updates build a new version
/// and never touch it.
#[derive(Debug, Clone, Default)]
pub struct ProjectGraph {
    root: PathBuf,
    files: BTreeMap<PathBuf, FileRecord>,
    symbols: SymbolIndex,
    references: ReferenceIndex,
    deps: DependencyGraph,
    last_indexed: Option<DateTime<Utc>>,
}

impl ProjectGraph {
    /// Create an empty graph for a project root.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    /// Absolute project root this graph describes.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record for a project-relative (or root-prefixed) path.
    #[must_use]
    pub fn file(&self, path: &Path) -> Option<&FileRecord> {
        self.files.get(self.relative(path))
    }

    /// Whether a file is indexed.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(self.relative(path))
    }

    /// All file records, ordered by path.
    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values()
    }

    /// All indexed paths, ordered.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Number of indexed files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Number of symbol definitions.
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Number of reference locations.
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// When the last merge batch completed.
    #[must_use]
    pub fn last_indexed(&self) -> Option<DateTime<Utc>> {
        self.last_indexed
    }

    /// File, service and component counts plus index sizes.
    #[must_use]
    pub fn summary(&self) -> GraphSummary {
        let count_kind = |kind: FileKind| self.files.values().filter(|r| r.kind == kind).count();
        GraphSummary {
            files: self.files.len(),
            services: count_kind(FileKind::Service),
            components: count_kind(FileKind::Component),
            symbols: self.symbols.len(),
            references: self.references.len(),
            dependency_edges: self.deps.edge_count(),
            last_indexed: self.last_indexed,
        }
    }

    /// Compare two graphs, ignoring indexing timestamps.
    ///
    /// Two graphs built from the same tree compare equal here whether they came
    /// from a cold scan, a warm scan or a chain of incremental updates.
    #[must_use]
    pub fn same_contents(&self, other: &Self) -> bool {
        self.root == other.root
            && self.files.len() == other.files.len()
            && self
                .files
                .iter()
                .zip(&other.files)
                .all(|((pa, ra), (pb, rb))| pa == pb && ra.same_contents(rb))
            && self.symbols == other.symbols
            && self.references == other.references
            && self.deps == other.deps
    }

    /// Insert or replace one file and everything it contributes.
    pub(crate) fn upsert(&mut self, entry: MergeEntry) {
        let MergeEntry {
            record,
            reference_lines,
            watched,
        } = entry;
        let path = record.path.clone();

        if let Some(previous) = self.files.remove(&path) {
            for id in &previous.symbols_defined {
                self.symbols.remove(id);
            }
        }
        for id in &record.symbols_defined {
            self.symbols.insert(id.clone());
        }
        self.references.set_file(&path, reference_lines);
        self.deps.set_file(&path, &record.depends_on, watched);
        self.files.insert(path, record);
    }

    /// Remove a file and everything it contributed.
    pub(crate) fn remove_file(&mut self, path: &Path) -> Option<FileRecord> {
        let record = self.files.remove(path)?;
        for id in &record.symbols_defined {
            self.symbols.remove(id);
        }
        self.references.remove_file(path);
        self.deps.remove_file(path);
        Some(record)
    }

    pub(crate) fn mark_indexed(&mut self, at: DateTime<Utc>) {
        self.last_indexed = Some(at);
    }

    /// Files to re-examine when `changed` paths change.
    pub(crate) fn invalidation_set<'a>(
        &self,
        changed: impl IntoIterator<Item = &'a Path>,
    ) -> BTreeSet<PathBuf> {
        self.deps.invalidation_set(changed)
    }

    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}
