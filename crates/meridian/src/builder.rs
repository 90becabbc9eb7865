//! Batch pipeline shared by full scans and incremental updates.
//!
//! A [`BuildPlan`] names the files to drop and the files to (re)index. The
//! builder drops removals first, then walks the targets in batches of
//! `batch_size`: load and hash in parallel, consult the content cache, analyze
//! the misses in parallel, and finally merge the batch into the graph on the
//! calling thread.
//!
//! Each batch is merged through [`Arc::make_mut`]. If a caller still holds an
//! earlier snapshot the graph is copied first, so snapshots never observe a
//! half-merged batch. Cancellation is checked before each batch starts.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, trace, warn};

use crate::cache::{CacheKey, ContentCache};
use crate::config::IndexerConfig;
use crate::error::Diagnostic;
use crate::graph::{MergeEntry, ProjectGraph};
use crate::languages::{Analyzer, AnalyzerRegistry};
use crate::parallel::{PendingAnalysis, WorkerPool};
use crate::scan::{FileMeta, LoadOutcome};
use crate::types::{FileFacts, FileRecord, Language, SymbolId};

/// Requests cancellation of a running index or update.
///
/// Clones share one flag. The builder checks it between merge batches, so a
/// cancelled run leaves the graph with exactly the batches that completed.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Ask the current run to stop at the next batch boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// What one run should do.
#[derive(Debug, Default)]
pub(crate) struct BuildPlan {
    /// Records to drop before anything is indexed
    pub removals: Vec<PathBuf>,
    /// Files to load and merge, in order
    pub targets: Vec<(PathBuf, Language)>,
}

/// Counters and diagnostics from one run.
#[derive(Debug, Default)]
pub(crate) struct BuildOutcome {
    pub merged: usize,
    pub analyzed: usize,
    pub cache_hits: usize,
    pub removed: usize,
    pub cancelled: bool,
    /// Targets that disappeared between planning and loading
    pub vanished: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildOutcome {
    /// Fold a follow-up run into this one.
    pub(crate) fn absorb(&mut self, other: BuildOutcome) {
        self.merged += other.merged;
        self.analyzed += other.analyzed;
        self.cache_hits += other.cache_hits;
        self.removed += other.removed;
        self.cancelled |= other.cancelled;
        self.vanished.extend(other.vanished);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Borrowed view of the indexer state a run needs.
pub(crate) struct Builder<'a> {
    pub root: &'a Path,
    pub config: &'a IndexerConfig,
    pub registry: &'a AnalyzerRegistry,
    pub pool: &'a WorkerPool,
    pub cache: &'a mut ContentCache,
    pub cancel: &'a CancelHandle,
}

/// A file whose facts are ready to merge.
struct Ready {
    meta: FileMeta,
    facts: Arc<FileFacts>,
}

impl Builder<'_> {
    /// Apply a plan. Imports resolve against `known`, the project's file set.
    ///
    /// Targets found missing on load are dropped from `known` before their
    /// batch merges and listed in [`BuildOutcome::vanished`]; importers merged
    /// in earlier batches still point at them until the caller re-runs them.
    pub(crate) fn run(
        &mut self,
        graph: &mut Arc<ProjectGraph>,
        plan: &BuildPlan,
        known: &mut HashSet<PathBuf>,
    ) -> BuildOutcome {
        let mut outcome = BuildOutcome::default();

        let doomed: Vec<&PathBuf> = plan
            .removals
            .iter()
            .filter(|path| graph.contains(path))
            .collect();
        if !doomed.is_empty() {
            let g = Arc::make_mut(graph);
            for path in doomed {
                if g.remove_file(path).is_some() {
                    debug!(path = %path.display(), "Removed file from graph");
                    outcome.removed += 1;
                }
            }
            g.mark_indexed(Utc::now());
        }

        for (batch_number, batch) in plan.targets.chunks(self.config.batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                info!(
                    batch = batch_number,
                    merged = outcome.merged,
                    "Indexing cancelled at batch boundary"
                );
                outcome.cancelled = true;
                break;
            }
            self.run_batch(graph, batch, known, &mut outcome);
        }

        outcome
    }

    fn run_batch(
        &mut self,
        graph: &mut Arc<ProjectGraph>,
        batch: &[(PathBuf, Language)],
        known: &mut HashSet<PathBuf>,
        outcome: &mut BuildOutcome,
    ) {
        let loaded = self
            .pool
            .load(self.root, batch, self.config.max_file_size);

        let mut ready: Vec<Ready> = Vec::with_capacity(loaded.len());
        let mut pending: Vec<PendingAnalysis> = Vec::new();
        let mut vanished: Vec<PathBuf> = Vec::new();

        for load in loaded {
            match load {
                LoadOutcome::Loaded(file) => {
                    let Some(analyzer) = self.registry.get(file.meta.language) else {
                        outcome
                            .diagnostics
                            .push(Diagnostic::unsupported_language(file.meta.path));
                        continue;
                    };
                    let key = CacheKey::new(
                        file.meta.language,
                        analyzer.version(),
                        file.meta.content_hash,
                    );
                    if let Some(facts) = self.cache.get(&key) {
                        trace!(path = %file.meta.path.display(), "Cache hit");
                        outcome.cache_hits += 1;
                        ready.push(Ready {
                            meta: file.meta,
                            facts,
                        });
                    } else {
                        pending.push(PendingAnalysis { file, key });
                    }
                }
                LoadOutcome::Missing(path) => vanished.push(path),
                LoadOutcome::Failed(diagnostic) => outcome.diagnostics.push(diagnostic),
            }
        }

        outcome.analyzed += pending.len();
        for analyzed in self.pool.analyze(self.registry, pending) {
            match analyzed.result {
                Ok(facts) => {
                    let facts = Arc::new(facts);
                    self.cache.put(analyzed.key, Arc::clone(&facts));
                    ready.push(Ready {
                        meta: analyzed.meta,
                        facts,
                    });
                }
                Err(e) => {
                    warn!(
                        path = %analyzed.meta.path.display(),
                        error = %e,
                        "Analysis failed, keeping previous record"
                    );
                    outcome
                        .diagnostics
                        .push(Diagnostic::analysis_failed(analyzed.meta.path, &e));
                }
            }
        }

        for path in &vanished {
            known.remove(path);
        }

        let now = Utc::now();
        let entries: Vec<MergeEntry> = ready
            .into_iter()
            .filter_map(|r| {
                let analyzer = self.registry.get(r.meta.language)?;
                Some(merge_entry(analyzer, r, &*known, now))
            })
            .collect();

        // Merge: the only place the graph changes
        let g = Arc::make_mut(graph);
        for path in vanished {
            if g.remove_file(&path).is_some() {
                debug!(path = %path.display(), "File vanished during scan, removed");
                outcome.removed += 1;
            }
            outcome.vanished.push(path);
        }
        outcome.merged += entries.len();
        for entry in entries {
            g.upsert(entry);
        }
        g.mark_indexed(now);
    }
}

/// Turn path-independent facts into a graph entry for one file.
///
/// Each import resolves to its first candidate that is a known file; every
/// candidate is watched so that creating it later invalidates this file.
fn merge_entry(
    analyzer: &dyn Analyzer,
    ready: Ready,
    known: &HashSet<PathBuf>,
    now: chrono::DateTime<Utc>,
) -> MergeEntry {
    let Ready { meta, facts } = ready;

    let mut depends_on = BTreeSet::new();
    let mut watched = BTreeSet::new();
    for import in &facts.imports {
        let candidates = analyzer.import_candidates(&meta.path, import);
        if let Some(target) = candidates
            .iter()
            .find(|c| **c != meta.path && known.contains(*c))
        {
            depends_on.insert(target.clone());
        }
        watched.extend(candidates);
    }

    let mut seen = HashSet::new();
    let symbols_defined: Vec<SymbolId> = facts
        .symbols
        .iter()
        .map(|s| SymbolId {
            name: s.name.clone(),
            definition_path: meta.path.clone(),
            definition_line: s.line,
            kind: s.kind,
        })
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let mut reference_lines: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
    for reference in &facts.references {
        reference_lines
            .entry(reference.name.clone())
            .or_default()
            .insert(reference.line);
    }

    MergeEntry {
        record: FileRecord {
            kind: analyzer.classify(&meta.path, &facts),
            path: meta.path,
            content_hash: meta.content_hash,
            language: meta.language,
            symbols_defined,
            depends_on,
            size_bytes: meta.size_bytes,
            last_indexed_at: now,
        },
        reference_lines,
        watched,
    }
}
