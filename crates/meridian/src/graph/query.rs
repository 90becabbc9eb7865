//! Read-only queries over a [`ProjectGraph`].
//!
//! Symbol and reference lookups go straight to the name-keyed indexes; their
//! cost depends on the number of results, not on the size of the project.
//! File-level traversals (impact, cycles, paths) walk only the dependency
//! graph.

use std::path::{Path, PathBuf};

use super::ProjectGraph;
use crate::types::{Cycle, Impact, Location, SymbolId};

impl ProjectGraph {
    /// All definitions with exactly this name.
    ///
    /// The same name may be defined in many places, so this is always a list.
    #[must_use]
    pub fn find_symbol(&self, name: &str) -> Vec<SymbolId> {
        self.symbols.lookup(name)
    }

    /// Every `(path, line)` where this name is used, ordered by path then line.
    #[must_use]
    pub fn find_references(&self, name: &str) -> Vec<Location> {
        self.references.lookup(name)
    }

    /// Case-insensitive substring search over symbol names.
    ///
    /// Exact name matches come first, then the remaining names alphabetically.
    /// Unlike [`ProjectGraph::find_symbol`] this visits every distinct name.
    #[must_use]
    pub fn search_symbols(&self, query: &str, limit: usize) -> Vec<SymbolId> {
        let needle = query.to_lowercase();
        let mut names: Vec<&str> = self
            .symbols
            .names()
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect();
        names.sort_by_key(|name| (!name.eq_ignore_ascii_case(query), *name));

        names
            .into_iter()
            .flat_map(|name| self.symbols.lookup(name))
            .take(limit)
            .collect()
    }

    /// Files the given file imports.
    #[must_use]
    pub fn dependencies(&self, path: &Path) -> Vec<PathBuf> {
        self.deps.dependencies(self.relative(path))
    }

    /// Files that import the given file.
    #[must_use]
    pub fn dependents(&self, path: &Path) -> Vec<PathBuf> {
        self.deps.dependents(self.relative(path))
    }

    /// Direct and transitive dependents of a file.
    #[must_use]
    pub fn impact(&self, path: &Path) -> Impact {
        let target = self.relative(path);
        Impact {
            target: target.to_path_buf(),
            direct_dependents: self.deps.dependents(target),
            transitive_dependents: self.deps.transitive_dependents(target),
        }
    }

    /// Groups of files that import each other, directly or indirectly.
    #[must_use]
    pub fn detect_cycles(&self) -> Vec<Cycle> {
        self.deps
            .cycles()
            .into_iter()
            .map(|files| Cycle { files })
            .collect()
    }

    /// Shortest import chain from one file to another, if any.
    #[must_use]
    pub fn dependency_path(&self, from: &Path, to: &Path) -> Option<Vec<PathBuf>> {
        self.deps
            .shortest_path(self.relative(from), self.relative(to))
    }
}
