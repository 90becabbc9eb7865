//! Name-keyed lookup structures.
//!
//! Both indexes follow replace-not-merge per file: a file's previous
//! contributions are removed in full before its new ones are added.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::types::{Location, SymbolId};

/// Symbol name → definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SymbolIndex {
    by_name: HashMap<String, BTreeSet<SymbolId>>,
    total: usize,
}

impl SymbolIndex {
    pub(crate) fn insert(&mut self, id: SymbolId) {
        if self.by_name.entry(id.name.clone()).or_default().insert(id) {
            self.total += 1;
        }
    }

    pub(crate) fn remove(&mut self, id: &SymbolId) {
        let Some(ids) = self.by_name.get_mut(&id.name) else {
            return;
        };
        if ids.remove(id) {
            self.total -= 1;
        }
        if ids.is_empty() {
            self.by_name.remove(&id.name);
        }
    }

    /// Definitions with exactly this name, in `SymbolId` order.
    pub(crate) fn lookup(&self, name: &str) -> Vec<SymbolId> {
        self.by_name
            .get(name)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.total
    }
}

/// Symbol name → use sites.
///
/// Locations are grouped by file so that one file's references can be
/// dropped without scanning the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ReferenceIndex {
    by_name: HashMap<String, BTreeMap<PathBuf, BTreeSet<u32>>>,
    names_by_file: HashMap<PathBuf, BTreeSet<String>>,
    total: usize,
}

impl ReferenceIndex {
    /// Record every use site in `path`, replacing what the file had before.
    pub(crate) fn set_file(&mut self, path: &Path, uses: BTreeMap<String, BTreeSet<u32>>) {
        self.remove_file(path);
        if uses.is_empty() {
            return;
        }
        let mut names = BTreeSet::new();
        for (name, lines) in uses {
            if lines.is_empty() {
                continue;
            }
            self.total += lines.len();
            names.insert(name.clone());
            self.by_name
                .entry(name)
                .or_default()
                .insert(path.to_path_buf(), lines);
        }
        if !names.is_empty() {
            self.names_by_file.insert(path.to_path_buf(), names);
        }
    }

    pub(crate) fn remove_file(&mut self, path: &Path) {
        let Some(names) = self.names_by_file.remove(path) else {
            return;
        };
        for name in names {
            let Some(files) = self.by_name.get_mut(&name) else {
                continue;
            };
            if let Some(lines) = files.remove(path) {
                self.total -= lines.len();
            }
            if files.is_empty() {
                self.by_name.remove(&name);
            }
        }
    }

    /// Use sites of `name`, ordered by path then line.
    pub(crate) fn lookup(&self, name: &str) -> Vec<Location> {
        let Some(files) = self.by_name.get(name) else {
            return Vec::new();
        };
        files
            .iter()
            .flat_map(|(path, lines)| {
                lines.iter().map(move |&line| Location {
                    path: path.clone(),
                    line,
                })
            })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymbolKind;

    fn id(name: &str, path: &str, line: u32) -> SymbolId {
        SymbolId {
            name: name.to_string(),
            definition_path: PathBuf::from(path),
            definition_line: line,
            kind: SymbolKind::Function,
        }
    }

    fn uses(entries: &[(&str, &[u32])]) -> BTreeMap<String, BTreeSet<u32>> {
        entries
            .iter()
            .map(|(name, lines)| (name.to_string(), lines.iter().copied().collect()))
            .collect()
    }

    #[test]
    fn symbol_index_holds_every_definition_of_a_name() {
        let mut index = SymbolIndex::default();
        index.insert(id("save", "b.ts", 1));
        index.insert(id("save", "a.ts", 4));
        index.insert(id("save", "a.ts", 4));

        let found = index.lookup("save");
        assert_eq!(found, vec![id("save", "a.ts", 4), id("save", "b.ts", 1)]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn symbol_index_drops_empty_names() {
        let mut index = SymbolIndex::default();
        index.insert(id("save", "a.ts", 1));
        index.remove(&id("save", "a.ts", 1));
        index.remove(&id("missing", "a.ts", 1));

        assert!(index.lookup("save").is_empty());
        assert_eq!(index.names().count(), 0);
        assert_eq!(index, SymbolIndex::default());
    }

    #[test]
    fn reference_index_replaces_per_file() {
        let mut index = ReferenceIndex::default();
        index.set_file(Path::new("b.ts"), uses(&[("foo", &[3, 7]), ("bar", &[1])]));
        index.set_file(Path::new("c.ts"), uses(&[("foo", &[2])]));
        index.set_file(Path::new("b.ts"), uses(&[("foo", &[9])]));

        let foo: Vec<_> = index
            .lookup("foo")
            .into_iter()
            .map(|l| (l.path, l.line))
            .collect();
        assert_eq!(
            foo,
            vec![(PathBuf::from("b.ts"), 9), (PathBuf::from("c.ts"), 2)]
        );
        assert!(index.lookup("bar").is_empty());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn reference_index_remove_restores_empty_state() {
        let mut index = ReferenceIndex::default();
        index.set_file(Path::new("b.ts"), uses(&[("foo", &[3])]));
        index.remove_file(Path::new("b.ts"));
        index.remove_file(Path::new("never.ts"));

        assert_eq!(index, ReferenceIndex::default());
    }
}
