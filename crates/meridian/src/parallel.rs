//! Parallel file loading and analysis.
//!
//! Each merge batch runs through these phases:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        one batch                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Load     (parallel):    read + hash on the worker pool      │
//! │  Partition (sequential): content cache hit / miss            │
//! │  Analyze  (parallel):    misses only, on the worker pool     │
//! │  Merge    (sequential):  replace-not-merge into the graph    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Workers only see owned inputs and return owned outputs; nothing shared is
//! mutated off the calling thread. File bytes are dropped as soon as the
//! analyzer returns.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::cache::CacheKey;
use crate::error::{AnalysisError, Error, Result};
use crate::languages::AnalyzerRegistry;
use crate::scan::{self, FileMeta, LoadOutcome, LoadedFile};
use crate::types::{FileFacts, Language};

/// A loaded file whose facts were not in the content cache.
#[derive(Debug)]
pub(crate) struct PendingAnalysis {
    pub file: LoadedFile,
    pub key: CacheKey,
}

/// Output of one analyzer call.
#[derive(Debug)]
pub(crate) struct AnalyzedFile {
    pub meta: FileMeta,
    pub key: CacheKey,
    pub result: std::result::Result<FileFacts, AnalysisError>,
}

/// Bounded pool of analysis workers, owned by one indexer.
pub(crate) struct WorkerPool {
    pool: ThreadPool,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl WorkerPool {
    pub(crate) fn new(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("meridian-worker-{i}"))
            .build()
            .map_err(|e| Error::Internal(format!("failed to start worker pool: {e}")))?;
        Ok(Self { pool })
    }

    pub(crate) fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Read and hash a batch of files. Output order matches input order.
    pub(crate) fn load(
        &self,
        root: &Path,
        files: &[(PathBuf, Language)],
        max_file_size: u64,
    ) -> Vec<LoadOutcome> {
        self.pool.install(|| {
            files
                .par_iter()
                .map(|(path, language)| scan::load_file(root, path, *language, max_file_size))
                .collect()
        })
    }

    /// Run analyzers over a batch of cache misses.
    pub(crate) fn analyze(
        &self,
        registry: &AnalyzerRegistry,
        pending: Vec<PendingAnalysis>,
    ) -> Vec<AnalyzedFile> {
        self.pool.install(|| {
            pending
                .into_par_iter()
                .map(|PendingAnalysis { file, key }| {
                    let LoadedFile { meta, content } = file;
                    let result = match registry.get(meta.language) {
                        Some(analyzer) => analyzer.analyze(&meta.path, &content),
                        None => Err(AnalysisError::Grammar(format!(
                            "no analyzer registered for {}",
                            meta.language.as_str()
                        ))),
                    };
                    AnalyzedFile { meta, key, result }
                })
                .collect()
        })
    }
}
