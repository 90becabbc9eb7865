//! Shared utilities for Meridian benchmarks.

// Benchmark utilities - pedantic lints not critical here
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::format_push_string)]
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use meridian::{AnalyzerRegistry, IndexerConfig, ProjectIndexer};
use tempfile::TempDir;

/// A workspace ready for benchmarking with the project already indexed.
pub struct IndexedWorkspace {
    /// Temp directory - must be kept alive for the duration of the benchmark.
    /// Access the workspace path via `dir.path()`.
    pub dir: TempDir,
    /// Indexer holding the project graph.
    pub indexer: ProjectIndexer,
}

/// Create a temporary workspace with the given files.
/// Returns the temp directory (must be kept alive) and the workspace path.
pub fn create_workspace(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");

    for (path, content) in files {
        let full_path = dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("failed to write file");
    }

    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Convert owned file list to borrowed references for `create_workspace`.
pub fn as_file_refs(files: &[(String, String)]) -> Vec<(&str, &str)> {
    files
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

/// An indexer with an in-memory cache and default settings.
pub fn new_indexer() -> ProjectIndexer {
    ProjectIndexer::new(IndexerConfig::default(), AnalyzerRegistry::with_defaults())
        .expect("failed to create indexer")
}

/// Create a workspace and run a full index.
/// Returns the indexed workspace ready for benchmarking queries and updates.
pub fn create_indexed_workspace(files: &[(&str, &str)]) -> IndexedWorkspace {
    let (dir, path) = create_workspace(files);
    let mut indexer = new_indexer();
    indexer.index_project(&path).expect("index failed");
    IndexedWorkspace { dir, indexer }
}

/// Generate a TypeScript project of `num_files` modules.
///
/// Files are spread over `services/`, `components/` and `lib/`. Module `i`
/// imports module `i - 1` and calls its exported function, so the project
/// forms a single import chain; every module also calls the shared `log`.
pub fn generate_ts_project(num_files: usize) -> Vec<(String, String)> {
    let mut files = vec![(
        "src/lib/log.ts".to_string(),
        "export function log(message: string) {\n    console.log(message);\n}\n".to_string(),
    )];

    for i in 0..num_files {
        let (dir, ext) = match i % 3 {
            0 => ("services", "ts"),
            1 => ("components", "tsx"),
            _ => ("lib", "ts"),
        };
        let mut code = String::from("import { log } from '../lib/log';\n");
        if i > 0 {
            let prev_dir = match (i - 1) % 3 {
                0 => "services",
                1 => "components",
                _ => "lib",
            };
            code.push_str(&format!(
                "import {{ step{prev} }} from '../{prev_dir}/module{prev}';\n",
                prev = i - 1
            ));
        }
        code.push('\n');
        code.push_str(&format!(
            "export interface Options{i} {{\n    id: number;\n    name: string;\n}}\n\n\
             export class Handler{i} {{\n    run(options: Options{i}) {{\n        log(options.name);\n    }}\n}}\n\n\
             export function step{i}(value: number): number {{\n"
        ));
        if i > 0 {
            code.push_str(&format!("    const prior = step{}(value);\n", i - 1));
            code.push_str("    return prior + 1;\n}\n");
        } else {
            code.push_str("    return value;\n}\n");
        }
        files.push((format!("src/{dir}/module{i}.{ext}"), code));
    }

    files
}
