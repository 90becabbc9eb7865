//! File-level dependency graph.
//!
//! Edges point from importer to imported file. Besides the resolved edges,
//! the graph keeps a *watch index*: every candidate path an import could
//! resolve to, mapped back to its importers. Invalidation walks the watch
//! index, which covers the resolved edges and also files that do not exist
//! yet, so creating `b.ts` re-resolves every file whose `./b` import was
//! dangling.
//!
//! ## Operations
//!
//! | Operation | Algorithm |
//! |-----------|-----------|
//! | Invalidation set | BFS over watchers with a visited set |
//! | Impact analysis | BFS over reverse edges |
//! | Cycle detection | Tarjan's SCC algorithm |
//! | Shortest path | A* with a zero heuristic |

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DependencyGraph {
    forward: HashMap<PathBuf, BTreeSet<PathBuf>>,
    reverse: HashMap<PathBuf, BTreeSet<PathBuf>>,
    watching: HashMap<PathBuf, BTreeSet<PathBuf>>,
    watchers: HashMap<PathBuf, BTreeSet<PathBuf>>,
    edges: usize,
}

impl DependencyGraph {
    /// Replace a file's outgoing edges and watched candidates.
    ///
    /// `depends_on` must be a subset of `watched`.
    pub(crate) fn set_file(
        &mut self,
        path: &Path,
        depends_on: &BTreeSet<PathBuf>,
        watched: BTreeSet<PathBuf>,
    ) {
        self.remove_file(path);

        for target in depends_on {
            self.reverse
                .entry(target.clone())
                .or_default()
                .insert(path.to_path_buf());
        }
        self.edges += depends_on.len();
        if !depends_on.is_empty() {
            self.forward.insert(path.to_path_buf(), depends_on.clone());
        }

        for candidate in &watched {
            self.watchers
                .entry(candidate.clone())
                .or_default()
                .insert(path.to_path_buf());
        }
        if !watched.is_empty() {
            self.watching.insert(path.to_path_buf(), watched);
        }
    }

    /// Drop a file's outgoing edges and watches.
    ///
    /// Edges *into* the file belong to its importers and are replaced when
    /// those importers are re-merged.
    pub(crate) fn remove_file(&mut self, path: &Path) {
        if let Some(targets) = self.forward.remove(path) {
            self.edges -= targets.len();
            for target in targets {
                detach(&mut self.reverse, &target, path);
            }
        }
        if let Some(candidates) = self.watching.remove(path) {
            for candidate in candidates {
                detach(&mut self.watchers, &candidate, path);
            }
        }
    }

    pub(crate) fn dependencies(&self, path: &Path) -> Vec<PathBuf> {
        self.forward
            .get(path)
            .map(|targets| targets.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn dependents(&self, path: &Path) -> Vec<PathBuf> {
        self.reverse
            .get(path)
            .map(|sources| sources.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges
    }

    /// Seeds plus every file that transitively imports (or may import) one.
    ///
    /// Cycles terminate because each file is visited once.
    pub(crate) fn invalidation_set<'a>(
        &self,
        seeds: impl IntoIterator<Item = &'a Path>,
    ) -> BTreeSet<PathBuf> {
        let mut visited: BTreeSet<PathBuf> = BTreeSet::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::new();
        for seed in seeds {
            if visited.insert(seed.to_path_buf()) {
                queue.push_back(seed.to_path_buf());
            }
        }

        while let Some(current) = queue.pop_front() {
            let Some(importers) = self.watchers.get(&current) else {
                continue;
            };
            for importer in importers {
                if visited.insert(importer.clone()) {
                    queue.push_back(importer.clone());
                }
            }
        }
        visited
    }

    /// Files that reach `path` through two or more edges, in BFS order.
    ///
    /// Direct dependents are excluded; `path` itself never appears, even
    /// when it sits on a cycle.
    pub(crate) fn transitive_dependents(&self, path: &Path) -> Vec<PathBuf> {
        let direct: HashSet<&PathBuf> = self
            .reverse
            .get(path)
            .map(|s| s.iter().collect())
            .unwrap_or_default();

        let mut visited: HashSet<&Path> = HashSet::from([path]);
        let mut queue: VecDeque<&Path> = VecDeque::new();
        for dependent in &direct {
            visited.insert(dependent.as_path());
            queue.push_back(dependent.as_path());
        }

        let mut result = Vec::new();
        while let Some(current) = queue.pop_front() {
            let Some(importers) = self.reverse.get(current) else {
                continue;
            };
            for importer in importers {
                if visited.insert(importer.as_path()) {
                    result.push(importer.clone());
                    queue.push_back(importer.as_path());
                }
            }
        }
        result
    }

    /// Build a petgraph view of the resolved edges.
    fn to_petgraph(&self) -> (DiGraph<&Path, ()>, HashMap<&Path, NodeIndex>) {
        let mut paths: BTreeSet<&Path> = BTreeSet::new();
        for (source, targets) in &self.forward {
            paths.insert(source.as_path());
            paths.extend(targets.iter().map(PathBuf::as_path));
        }

        let mut graph = DiGraph::with_capacity(paths.len(), self.edges);
        let mut node_map = HashMap::with_capacity(paths.len());
        for path in paths {
            node_map.insert(path, graph.add_node(path));
        }
        for (source, targets) in &self.forward {
            let from = node_map[source.as_path()];
            for target in targets {
                graph.add_edge(from, node_map[target.as_path()], ());
            }
        }
        (graph, node_map)
    }

    /// Strongly connected components that form a cycle, each sorted.
    pub(crate) fn cycles(&self) -> Vec<Vec<PathBuf>> {
        let (graph, _) = self.to_petgraph();
        let mut cycles: Vec<Vec<PathBuf>> = algo::tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&n| graph.contains_edge(n, n))
            })
            .map(|component| {
                let mut files: Vec<PathBuf> =
                    component.iter().map(|&n| graph[n].to_path_buf()).collect();
                files.sort();
                files
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Shortest import chain from `from` to `to`, both ends included.
    pub(crate) fn shortest_path(&self, from: &Path, to: &Path) -> Option<Vec<PathBuf>> {
        let (graph, node_map) = self.to_petgraph();
        let start = *node_map.get(from)?;
        let goal = *node_map.get(to)?;
        let (_, nodes) = algo::astar(&graph, start, |n| n == goal, |_| 1_u32, |_| 0)?;
        Some(nodes.into_iter().map(|n| graph[n].to_path_buf()).collect())
    }
}

fn detach(map: &mut HashMap<PathBuf, BTreeSet<PathBuf>>, key: &Path, member: &Path) {
    if let Some(members) = map.get_mut(key) {
        members.remove(member);
        if members.is_empty() {
            map.remove(key);
        }
    }
}
