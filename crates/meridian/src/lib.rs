//! # Meridian: Incremental Project Indexer
//!
//! Meridian scans a source tree, builds an in-memory structural graph of its
//! files and symbols, and keeps that graph correct and fast to query as files
//! change. Analysis is done with tree-sitter; results are memoized by content
//! hash and persisted in `SQLite` between runs.
//!
//! ## Design Philosophy
//!
//! - **Index, don't scan** - Symbol and reference lookups go to pre-built maps
//! - **Pay for what changed** - Updates re-analyze the changed files and their importers
//! - **Correct before minimal** - Over-invalidate rather than serve stale facts
//! - **Best effort** - One bad file yields a diagnostic, never a failed run
//! - **Library first** - The `meridian` binary is a thin layer over this crate
//!
//! ## Quick Start
//!
//! ```no_run
//! use meridian::ProjectIndexer;
//! use std::path::Path;
//!
//! let mut indexer = ProjectIndexer::open(Path::new("/path/to/project"))?;
//!
//! // Full scan (warm if a cache was persisted before)
//! let report = indexer.index_project(Path::new("/path/to/project"))?;
//! println!("Indexed {} files", report.stats.files_indexed);
//!
//! // Exact-name lookups
//! for id in indexer.find_symbol("authenticate") {
//!     println!("{}:{}", id.definition_path.display(), id.definition_line);
//! }
//!
//! // After an editor save
//! indexer.update_index(["src/auth.ts"])?;
//!
//! indexer.persist_cache()?;
//! # Ok::<(), meridian::Error>(())
//! ```
//!
//! ## Known Limitation
//!
//! Invalidation follows imports, not calls. Renaming `foo` in `a.ts` leaves
//! the reference to `foo` from a file that calls it without importing `a.ts`
//! in place until that file is itself updated.

pub mod cache;
pub mod config;
mod builder;
mod error;
mod graph;
pub mod languages;
mod parallel;
pub mod resolver;
mod scan;
mod types;

pub use builder::CancelHandle;
pub use cache::{CacheKey, CacheStats, CacheStore, ContentCache, LoadedEntries, SqliteCacheStore};
pub use config::IndexerConfig;
pub use error::{AnalysisError, Diagnostic, DiagnosticKind, Error, Result};
pub use graph::ProjectGraph;
pub use languages::{Analyzer, AnalyzerRegistry, EcmaAnalyzer, RustAnalyzer};
pub use types::{
    ContentHash, Cycle, DefinedSymbol, FileFacts, FileKind, FileRecord, GraphSummary, Impact,
    ImportSpec, IndexReport, IndexStats, Language, Location, ReferenceKind, SymbolId, SymbolKind,
    SymbolReference, UpdateReport, Visibility,
};

use std::collections::{BTreeSet, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use builder::{BuildOutcome, BuildPlan, Builder};
use parallel::WorkerPool;

/// Indexes one project and answers queries about it.
///
/// An indexer owns its graph, its content cache and its worker pool; separate
/// indexers share nothing and can run side by side without coordination.
///
/// Mutating operations take `&mut self`. Readers that need to outlive a call
/// take a snapshot with [`ProjectIndexer::project_graph`]; snapshots are never
/// modified afterwards.
pub struct ProjectIndexer {
    config: IndexerConfig,
    registry: AnalyzerRegistry,
    pool: WorkerPool,
    cache: ContentCache,
    store: Option<Box<dyn CacheStore>>,
    graph: Arc<ProjectGraph>,
    /// Every indexable path seen on disk, including files that failed analysis
    known_files: HashSet<PathBuf>,
    indexed: bool,
    cancel: CancelHandle,
    /// Problems found outside a run, reported with the next one
    pending_diagnostics: Vec<Diagnostic>,
}

impl std::fmt::Debug for ProjectIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectIndexer")
            .field("root", &self.graph.root())
            .field("files", &self.graph.file_count())
            .field("indexed", &self.indexed)
            .field("cache", &self.cache.stats())
            .field("workers", &self.pool.threads())
            .finish_non_exhaustive()
    }
}

impl ProjectIndexer {
    /// Create an indexer with an in-memory cache only.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid and
    /// `Error::Internal` if the worker pool cannot be started.
    pub fn new(config: IndexerConfig, registry: AnalyzerRegistry) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.worker_count())?;
        let cache = ContentCache::new(config.cache_capacity);
        Ok(Self {
            config,
            registry,
            pool,
            cache,
            store: None,
            graph: Arc::new(ProjectGraph::default()),
            known_files: HashSet::new(),
            indexed: false,
            cancel: CancelHandle::default(),
            pending_diagnostics: Vec::new(),
        })
    }

    /// Attach a persistent store and warm the cache from it.
    ///
    /// A store that cannot be read leaves the cache empty; corrupt entries are
    /// skipped. Both are reported as diagnostics with the next run.
    #[must_use]
    pub fn with_cache_store(mut self, store: Box<dyn CacheStore>) -> Self {
        let location = store
            .location()
            .map_or_else(|| PathBuf::from(config::META_DIR), Path::to_path_buf);
        match store.load() {
            Ok(loaded) => {
                if loaded.corrupt > 0 {
                    self.pending_diagnostics.push(Diagnostic::new(
                        location,
                        DiagnosticKind::CacheCorrupt,
                        format!("{} corrupt cache entries skipped", loaded.corrupt),
                    ));
                }
                let warmed = self.cache.warm(loaded.entries);
                debug!(entries = warmed, "Warmed content cache");
            }
            Err(e) => {
                warn!(error = %e, "Cache store unreadable, starting cold");
                self.pending_diagnostics.push(Diagnostic::new(
                    location,
                    DiagnosticKind::CacheCorrupt,
                    e.to_string(),
                ));
            }
        }
        self.store = Some(store);
        self
    }

    /// Create an indexer for `root` with its configuration and `SQLite` cache.
    ///
    /// Reads `<root>/.meridian/config.yaml` if present and opens the cache at
    /// the configured location, recreating it if it is unusable. The project
    /// is not indexed yet.
    ///
    /// # Errors
    ///
    /// Returns `Error::RootNotFound`/`Error::InvalidRoot` for a bad root and
    /// `Error::Config` for a malformed configuration file.
    pub fn open(root: &Path) -> Result<Self> {
        let root = resolve_root(root)?;
        let config = IndexerConfig::load(&root)?;
        let cache_path = config.cache_location(&root);
        let indexer = Self::new(config, AnalyzerRegistry::with_defaults())?;

        match SqliteCacheStore::open_or_recreate(&cache_path) {
            Ok(store) => Ok(indexer.with_cache_store(Box::new(store))),
            Err(e) => {
                warn!(
                    path = %cache_path.display(),
                    error = %e,
                    "Cannot open cache store, continuing without persistence"
                );
                Ok(indexer)
            }
        }
    }

    // === Indexing ===

    /// Scan the whole project under `root` and bring the graph up to date.
    ///
    /// Files whose content hash is cached skip analysis. Records for files no
    /// longer on disk are removed. Indexing a different root than before
    /// starts from an empty graph; the content cache is kept.
    ///
    /// Each run starts uncancelled; [`CancelHandle::cancel`] stops it at the
    /// next batch boundary.
    ///
    /// # Errors
    ///
    /// Only a missing or unreadable root fails the call. Everything else is
    /// reported in [`IndexReport::diagnostics`].
    pub fn index_project(&mut self, root: impl AsRef<Path>) -> Result<IndexReport> {
        let start = Instant::now();
        let root = resolve_root(root.as_ref())?;

        if self.graph.root() != root {
            self.graph = Arc::new(ProjectGraph::new(root.clone()));
            self.known_files.clear();
            self.indexed = false;
        }
        self.cancel.reset();

        let discovery = scan::discover(&root, &self.config, &self.registry);
        self.known_files = discovery.files.iter().map(|(p, _)| p.clone()).collect();
        let removals = self
            .graph
            .paths()
            .filter(|p| !self.known_files.contains(*p))
            .map(Path::to_path_buf)
            .collect();
        let plan = BuildPlan {
            removals,
            targets: discovery.files,
        };

        let (outcome, _) = self.execute(&root, &plan);
        self.indexed = true;

        let mut diagnostics = std::mem::take(&mut self.pending_diagnostics);
        diagnostics.extend(discovery.diagnostics);
        diagnostics.extend(outcome.diagnostics);

        let stats = IndexStats {
            files_indexed: outcome.merged,
            files_analyzed: outcome.analyzed,
            cache_hits: outcome.cache_hits,
            files_removed: outcome.removed,
            symbols_found: self.graph.symbol_count(),
            references_found: self.graph.reference_count(),
            duration: start.elapsed(),
            cancelled: outcome.cancelled,
            directories_skipped: discovery.directories_skipped,
        };
        info!(
            root = %root.display(),
            files = stats.files_indexed,
            analyzed = stats.files_analyzed,
            cache_hits = stats.cache_hits,
            removed = stats.files_removed,
            diagnostics = diagnostics.len(),
            cancelled = stats.cancelled,
            duration_ms = stats.duration.as_millis(),
            "Indexed project"
        );

        Ok(IndexReport {
            graph: Arc::clone(&self.graph),
            stats,
            diagnostics,
        })
    }

    /// Re-index files believed to have changed (created, modified or deleted).
    ///
    /// The invalidation set is the given paths plus every file that imports
    /// one of them, transitively. Only that set is re-read; the rest of the
    /// graph is untouched. Paths may be project-relative or absolute under
    /// the root.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotIndexed` if [`ProjectIndexer::index_project`] has
    /// not run yet. Per-file problems are reported in the diagnostics.
    pub fn update_index<I>(&mut self, paths: I) -> Result<UpdateReport>
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        if !self.indexed {
            return Err(Error::NotIndexed);
        }
        let start = Instant::now();
        let root = self.graph.root().to_path_buf();
        self.cancel.reset();

        let mut diagnostics = std::mem::take(&mut self.pending_diagnostics);
        let mut changed: BTreeSet<PathBuf> = BTreeSet::new();
        for path in paths {
            let path = path.as_ref();
            match project_relative(&root, path) {
                Some(relative) => {
                    changed.insert(relative);
                }
                None => diagnostics.push(Diagnostic::new(
                    path.to_path_buf(),
                    DiagnosticKind::OutsideProject,
                    "path is outside the project root",
                )),
            }
        }

        let mut present: HashSet<&Path> = HashSet::new();
        for path in &changed {
            if !scan::is_indexable_file(&root, path, &self.config) {
                continue;
            }
            if self.registry.supports(path) {
                present.insert(path);
            } else if !self.graph.contains(path) {
                diagnostics.push(Diagnostic::unsupported_language(path.clone()));
            }
        }
        for path in &changed {
            if present.contains(path.as_path()) {
                self.known_files.insert(path.clone());
            } else {
                self.known_files.remove(path);
            }
        }

        let mut invalidated = self
            .graph
            .invalidation_set(changed.iter().map(PathBuf::as_path));

        let mut plan = BuildPlan::default();
        for path in &invalidated {
            if changed.contains(path) && !present.contains(path.as_path()) {
                plan.removals.push(path.clone());
            } else if let Some(language) = self.registry.language_for(path) {
                plan.targets.push((path.clone(), language));
            }
        }
        debug!(
            changed = changed.len(),
            invalidated = invalidated.len(),
            targets = plan.targets.len(),
            removals = plan.removals.len(),
            "Computed invalidation set"
        );

        let (outcome, followup) = self.execute(&root, &plan);
        invalidated.extend(followup);
        diagnostics.extend(outcome.diagnostics);

        let report = UpdateReport {
            invalidated: invalidated.into_iter().collect(),
            files_reindexed: outcome.merged,
            files_analyzed: outcome.analyzed,
            cache_hits: outcome.cache_hits,
            files_removed: outcome.removed,
            duration: start.elapsed(),
            cancelled: outcome.cancelled,
            diagnostics,
        };
        info!(
            invalidated = report.invalidated.len(),
            reindexed = report.files_reindexed,
            analyzed = report.files_analyzed,
            removed = report.files_removed,
            cancelled = report.cancelled,
            duration_ms = report.duration.as_millis(),
            "Updated index"
        );
        Ok(report)
    }

    /// Run a plan, then re-run the importers of every target that vanished
    /// on load until none do. Returns the combined outcome and the importers
    /// that were re-run.
    fn execute(&mut self, root: &Path, plan: &BuildPlan) -> (BuildOutcome, BTreeSet<PathBuf>) {
        let mut builder = Builder {
            root,
            config: &self.config,
            registry: &self.registry,
            pool: &self.pool,
            cache: &mut self.cache,
            cancel: &self.cancel,
        };
        let mut outcome = builder.run(&mut self.graph, plan, &mut self.known_files);

        let mut followup = BTreeSet::new();
        let mut settled = 0;
        while settled < outcome.vanished.len() && !outcome.cancelled {
            let importers = self
                .graph
                .invalidation_set(outcome.vanished[settled..].iter().map(PathBuf::as_path));
            settled = outcome.vanished.len();

            let retry = BuildPlan {
                removals: Vec::new(),
                targets: importers
                    .into_iter()
                    .filter(|path| self.known_files.contains(path))
                    .filter_map(|path| {
                        let language = self.registry.language_for(&path)?;
                        Some((path, language))
                    })
                    .collect(),
            };
            debug!(
                vanished = settled,
                importers = retry.targets.len(),
                "Re-resolving importers of vanished files"
            );
            followup.extend(retry.targets.iter().map(|(path, _)| path.clone()));
            outcome.absorb(builder.run(&mut self.graph, &retry, &mut self.known_files));
        }

        (outcome, followup)
    }

    /// Handle for cancelling a run from another thread.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Whether a full index has completed at least once.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    // === Queries ===

    /// All definitions with exactly this name.
    #[must_use]
    pub fn find_symbol(&self, name: &str) -> Vec<SymbolId> {
        self.graph.find_symbol(name)
    }

    /// Every `(path, line)` where this name is used.
    #[must_use]
    pub fn find_references(&self, name: &str) -> Vec<Location> {
        self.graph.find_references(name)
    }

    /// Snapshot of the graph as of the last completed run.
    #[must_use]
    pub fn project_graph(&self) -> Arc<ProjectGraph> {
        Arc::clone(&self.graph)
    }

    // === Cache ===

    /// Save the content cache to the attached store, returning entries written.
    ///
    /// Without a store this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn persist_cache(&self) -> Result<usize> {
        match &self.store {
            Some(store) => store.save(&self.cache.snapshot()),
            None => Ok(0),
        }
    }

    /// Current content cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached analysis. The next run re-analyzes everything.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }
}

/// Canonicalize a project root and check it is a readable directory.
fn resolve_root(root: &Path) -> Result<PathBuf> {
    let canonical = root.canonicalize().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::RootNotFound(root.to_path_buf()),
        _ => Error::InvalidRoot(root.to_path_buf()),
    })?;
    if !canonical.is_dir() || std::fs::read_dir(&canonical).is_err() {
        return Err(Error::InvalidRoot(canonical));
    }
    Ok(canonical)
}

/// Turn a caller-supplied path into a normalized project-relative one.
fn project_relative(root: &Path, path: &Path) -> Option<PathBuf> {
    let relative = if path.is_absolute() {
        match path.strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            // The root is canonical; the caller's path may not be
            Err(_) => {
                let parent = path.parent()?.canonicalize().ok()?;
                parent.strip_prefix(root).ok()?.join(path.file_name()?)
            }
        }
    } else {
        path.to_path_buf()
    };
    let normalized = resolver::normalize(&relative)?;
    normalized
        .components()
        .next()
        .is_some_and(|c| matches!(c, Component::Normal(_)))
        .then_some(normalized)
}
