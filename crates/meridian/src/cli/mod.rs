//! CLI command implementations.

mod display;

pub mod cycles;
pub mod deps;
pub mod index;
pub mod refs;
pub mod stats;
pub mod symbol;

use std::path::Path;

use meridian::{AnalyzerRegistry, IndexReport, IndexerConfig, ProjectIndexer};

/// Index the workspace, warm from the persisted cache unless `no_cache` is set.
///
/// The cache is saved again afterwards; a failed save is logged, not fatal.
pub fn load_project(
    workspace: &Path,
    no_cache: bool,
) -> Result<(ProjectIndexer, IndexReport), meridian::Error> {
    let mut indexer = if no_cache {
        ProjectIndexer::new(
            IndexerConfig::load(workspace)?,
            AnalyzerRegistry::with_defaults(),
        )?
    } else {
        ProjectIndexer::open(workspace)?
    };

    let report = indexer.index_project(workspace)?;

    if !no_cache {
        match indexer.persist_cache() {
            Ok(saved) => tracing::debug!(entries = saved, "Persisted content cache"),
            Err(e) => tracing::warn!(error = %e, "Failed to persist content cache"),
        }
    }

    Ok((indexer, report))
}
