//! Integration tests for `update_index`.
//!
//! The central property: after any sequence of edits, updating with the
//! changed paths yields the same graph as indexing the tree from scratch.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use meridian::{
    AnalysisError, Analyzer, AnalyzerRegistry, DiagnosticKind, EcmaAnalyzer, Error, FileFacts,
    ImportSpec, IndexerConfig, Language, Location, ProjectIndexer,
};
use proptest::prelude::*;
use rstest::rstest;
use tempfile::TempDir;

fn test_config() -> IndexerConfig {
    IndexerConfig {
        workers: Some(2),
        ..IndexerConfig::default()
    }
}

/// Create a temporary workspace with the given files and index it.
fn workspace_with_files(files: &[(&str, &str)]) -> (TempDir, ProjectIndexer) {
    workspace_with_config(test_config(), files)
}

fn workspace_with_config(
    config: IndexerConfig,
    files: &[(&str, &str)],
) -> (TempDir, ProjectIndexer) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    for (path, content) in files {
        write_file(dir.path(), path, content);
    }
    let mut indexer = ProjectIndexer::new(config, AnalyzerRegistry::with_defaults())
        .expect("failed to create indexer");
    indexer.index_project(dir.path()).expect("initial index failed");
    (dir, indexer)
}

fn write_file(root: &Path, path: &str, content: &str) {
    let full_path = root.join(path);
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).expect("failed to create parent dirs");
    }
    fs::write(&full_path, content).expect("failed to write file");
}

fn fresh_graph(root: &Path) -> std::sync::Arc<meridian::ProjectGraph> {
    fresh_graph_with(test_config(), root)
}

fn fresh_graph_with(config: IndexerConfig, root: &Path) -> std::sync::Arc<meridian::ProjectGraph> {
    let mut indexer = ProjectIndexer::new(config, AnalyzerRegistry::with_defaults())
        .expect("failed to create indexer");
    indexer.index_project(root).expect("fresh index failed").graph
}

fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

// === Basic edits ===

#[test]
fn modified_file_replaces_its_contributions() {
    let (dir, mut indexer) = workspace_with_files(&[
        ("a.ts", "export function foo() {}\nfoo();\n"),
        ("b.ts", "export function other() {}\n"),
    ]);

    write_file(dir.path(), "a.ts", "\nexport function foo() {}\nexport function baz() {}\n");
    let update = indexer.update_index(["a.ts"]).expect("update failed");

    assert_eq!(update.files_reindexed, 1);
    assert_eq!(update.files_analyzed, 1);
    assert_eq!(indexer.find_symbol("foo")[0].definition_line, 2);
    assert_eq!(indexer.find_symbol("baz").len(), 1);
    assert!(indexer.find_references("foo").is_empty());
    assert!(indexer.project_graph().same_contents(&fresh_graph(dir.path())));
}

#[test]
fn deleted_file_is_removed_and_importers_lose_the_edge() {
    let (dir, mut indexer) = workspace_with_files(&[
        ("a.ts", "export function foo() {}\n"),
        ("b.ts", "import { foo } from './a';\nfoo();\n"),
    ]);
    assert_eq!(
        indexer.project_graph().dependencies(Path::new("b.ts")),
        paths(&["a.ts"])
    );

    fs::remove_file(dir.path().join("a.ts")).unwrap();
    let update = indexer.update_index(["a.ts"]).expect("update failed");

    assert_eq!(update.invalidated, paths(&["a.ts", "b.ts"]));
    assert_eq!(update.files_removed, 1);
    let graph = indexer.project_graph();
    assert!(!graph.contains(Path::new("a.ts")));
    assert!(graph.dependencies(Path::new("b.ts")).is_empty());
    assert!(indexer.find_symbol("foo").is_empty());
    // the call site itself is still there
    assert_eq!(
        indexer.find_references("foo"),
        vec![
            Location {
                path: PathBuf::from("b.ts"),
                line: 1
            },
            Location {
                path: PathBuf::from("b.ts"),
                line: 2
            },
        ]
    );
    assert!(graph.same_contents(&fresh_graph(dir.path())));
}

#[test]
fn created_file_resolves_pending_import() {
    let (dir, mut indexer) =
        workspace_with_files(&[("b.ts", "import { foo } from './a';\nfoo();\n")]);
    assert!(indexer.project_graph().dependencies(Path::new("b.ts")).is_empty());

    write_file(dir.path(), "a.ts", "export function foo() {}\n");
    let update = indexer.update_index(["a.ts"]).expect("update failed");

    assert_eq!(update.invalidated, paths(&["a.ts", "b.ts"]));
    let graph = indexer.project_graph();
    assert_eq!(graph.dependencies(Path::new("b.ts")), paths(&["a.ts"]));
    assert_eq!(graph.dependents(Path::new("a.ts")), paths(&["b.ts"]));
    assert!(graph.same_contents(&fresh_graph(dir.path())));
}

#[test]
fn created_index_file_takes_over_directory_import() {
    let (dir, mut indexer) = workspace_with_files(&[
        ("src/app.ts", "import { db } from './db';\n"),
        ("src/db/index.ts", "export const db = 1;\n"),
    ]);
    assert_eq!(
        indexer.project_graph().dependencies(Path::new("src/app.ts")),
        paths(&["src/db/index.ts"])
    );

    // `./db.ts` is a more specific candidate than `./db/index.ts`
    write_file(dir.path(), "src/db.ts", "export const db = 2;\n");
    indexer.update_index(["src/db.ts"]).expect("update failed");

    assert_eq!(
        indexer.project_graph().dependencies(Path::new("src/app.ts")),
        paths(&["src/db.ts"])
    );
}

#[test]
fn transitive_importers_are_invalidated() {
    let (dir, mut indexer) = workspace_with_files(&[
        ("a.ts", "export function a() {}\n"),
        ("b.ts", "import { a } from './a';\nexport function b() { a(); }\n"),
        ("c.ts", "import { b } from './b';\nb();\n"),
        ("d.ts", "export function d() {}\n"),
    ]);

    write_file(dir.path(), "a.ts", "export function a2() {}\n");
    let update = indexer.update_index(["a.ts"]).expect("update failed");

    assert_eq!(update.invalidated, paths(&["a.ts", "b.ts", "c.ts"]));
    assert_eq!(update.files_reindexed, 3);
    // b and c are unchanged on disk, so their facts come from the cache
    assert_eq!(update.files_analyzed, 1);
    assert_eq!(update.cache_hits, 2);
}

#[test]
fn import_cycles_terminate() {
    let (dir, mut indexer) = workspace_with_files(&[
        ("a.ts", "import { b } from './b';\nexport function a() {}\n"),
        ("b.ts", "import { a } from './a';\nexport function b() {}\n"),
    ]);

    write_file(dir.path(), "a.ts", "import { b } from './b';\nexport function a() { b(); }\n");
    let update = indexer.update_index(["a.ts"]).expect("update failed");

    assert_eq!(update.invalidated, paths(&["a.ts", "b.ts"]));
    assert_eq!(indexer.project_graph().detect_cycles().len(), 1);
}

#[test]
fn unrelated_files_are_untouched() {
    let files: Vec<(String, String)> = (0..10)
        .map(|i| (format!("m{i}.ts"), format!("export function f{i}() {{}}\n")))
        .collect();
    let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    let (dir, mut indexer) = workspace_with_files(&refs);
    let before = indexer.project_graph();

    write_file(dir.path(), "m3.ts", "export function g3() {}\n");
    let update = indexer.update_index(["m3.ts"]).expect("update failed");

    assert_eq!(update.invalidated, paths(&["m3.ts"]));
    assert_eq!(update.files_analyzed, 1);
    let after = indexer.project_graph();
    for i in (0..10).filter(|i| *i != 3) {
        let path = PathBuf::from(format!("m{i}.ts"));
        assert_eq!(
            before.file(&path).unwrap().last_indexed_at,
            after.file(&path).unwrap().last_indexed_at,
            "{} should not be re-merged",
            path.display()
        );
    }
}

#[test]
fn absolute_paths_under_the_root_are_accepted() {
    let (dir, mut indexer) = workspace_with_files(&[("src/a.ts", "export function foo() {}\n")]);

    write_file(dir.path(), "src/a.ts", "export function bar() {}\n");
    let update = indexer
        .update_index([dir.path().join("src/a.ts")])
        .expect("update failed");

    assert_eq!(update.invalidated, paths(&["src/a.ts"]));
    assert_eq!(indexer.find_symbol("bar").len(), 1);
}

#[test]
fn update_with_no_paths_is_a_no_op() {
    let (_dir, mut indexer) = workspace_with_files(&[("a.ts", "export function foo() {}\n")]);
    let before = indexer.project_graph();

    let update = indexer
        .update_index(Vec::<PathBuf>::new())
        .expect("update failed");

    assert!(update.invalidated.is_empty());
    assert!(std::sync::Arc::ptr_eq(&before, &indexer.project_graph()));
}

// === Errors and diagnostics ===

#[test]
fn update_before_index_is_rejected() {
    let mut indexer = ProjectIndexer::new(test_config(), AnalyzerRegistry::with_defaults())
        .expect("failed to create indexer");

    let err = indexer.update_index(["a.ts"]).unwrap_err();

    assert!(matches!(err, Error::NotIndexed));
}

#[rstest]
#[case::parent_escape("../outside.ts")]
#[case::nested_escape("src/../../outside.ts")]
fn paths_outside_the_root_are_diagnosed(#[case] path: &str) {
    let (_dir, mut indexer) = workspace_with_files(&[("src/a.ts", "export const a = 1;\n")]);

    let update = indexer.update_index([path]).expect("update should succeed");

    assert!(update.invalidated.is_empty());
    assert_eq!(update.diagnostics.len(), 1);
    assert_eq!(update.diagnostics[0].kind, DiagnosticKind::OutsideProject);
}

#[test]
fn absolute_path_in_another_tree_is_diagnosed() {
    let (_dir, mut indexer) = workspace_with_files(&[("a.ts", "export const a = 1;\n")]);
    let other = tempfile::tempdir().unwrap();
    write_file(other.path(), "b.ts", "export const b = 1;\n");

    let update = indexer
        .update_index([other.path().join("b.ts")])
        .expect("update should succeed");

    assert_eq!(update.diagnostics[0].kind, DiagnosticKind::OutsideProject);
    assert_eq!(indexer.project_graph().file_count(), 1);
}

#[test]
fn unsupported_file_is_diagnosed() {
    let (dir, mut indexer) = workspace_with_files(&[("a.ts", "export const a = 1;\n")]);
    write_file(dir.path(), "notes.md", "# notes\n");

    let update = indexer.update_index(["notes.md"]).expect("update should succeed");

    assert_eq!(update.diagnostics.len(), 1);
    assert_eq!(update.diagnostics[0].kind, DiagnosticKind::UnsupportedLanguage);
    assert!(!indexer.project_graph().contains(Path::new("notes.md")));
}

#[test]
fn file_in_excluded_directory_is_ignored() {
    let (dir, mut indexer) = workspace_with_files(&[("a.ts", "export const a = 1;\n")]);
    write_file(dir.path(), "node_modules/pkg/index.ts", "export const p = 1;\n");

    indexer
        .update_index(["node_modules/pkg/index.ts"])
        .expect("update should succeed");

    assert_eq!(indexer.project_graph().file_count(), 1);
}

#[rstest]
#[case::one_batch(256)]
#[case::importer_merged_first(1)]
fn unreported_deletion_found_on_load_drops_importer_edges(#[case] batch_size: usize) {
    let config = IndexerConfig {
        batch_size,
        ..test_config()
    };
    let (dir, mut indexer) = workspace_with_config(
        config.clone(),
        &[
            ("a.ts", "import { b } from './b';\n"),
            ("b.ts", "import { c } from './c';\nexport const b = c;\n"),
            ("c.ts", "export const c = 1;\n"),
        ],
    );
    assert_eq!(
        indexer.project_graph().dependencies(Path::new("a.ts")),
        paths(&["b.ts"])
    );

    // b.ts goes too, but only c.ts is reported
    fs::remove_file(dir.path().join("b.ts")).unwrap();
    fs::remove_file(dir.path().join("c.ts")).unwrap();
    let update = indexer.update_index(["c.ts"]).expect("update failed");

    assert_eq!(update.files_removed, 2);
    let graph = indexer.project_graph();
    assert!(!graph.contains(Path::new("b.ts")));
    assert!(graph.dependencies(Path::new("a.ts")).is_empty());
    assert!(graph.dependents(Path::new("b.ts")).is_empty());
    assert!(graph.same_contents(&fresh_graph_with(config, dir.path())));

    // the dangling import is still watched
    write_file(dir.path(), "b.ts", "export const b = 2;\n");
    indexer.update_index(["b.ts"]).expect("update failed");
    assert_eq!(
        indexer.project_graph().dependencies(Path::new("a.ts")),
        paths(&["b.ts"])
    );
}

#[cfg(unix)]
#[test]
fn file_reached_through_symlinked_directory_is_ignored() {
    let (dir, mut indexer) = workspace_with_files(&[
        ("real/a.ts", "export const a = 1;\n"),
        ("b.ts", "import { a } from './linked/a';\n"),
    ]);
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("linked"))
        .expect("failed to create symlink");

    let update = indexer
        .update_index(["linked/a.ts"])
        .expect("update should succeed");

    assert!(update.diagnostics.is_empty());
    let graph = indexer.project_graph();
    assert!(!graph.contains(Path::new("linked/a.ts")));
    assert!(graph.dependencies(Path::new("b.ts")).is_empty());
    assert!(graph.same_contents(&fresh_graph(dir.path())));
}

#[test]
fn meta_dir_is_ignored_with_hidden_files_enabled() {
    let config = IndexerConfig {
        include_hidden: true,
        ..test_config()
    };
    let (dir, mut indexer) =
        workspace_with_config(config.clone(), &[(".config/a.ts", "export const a = 1;\n")]);
    write_file(dir.path(), ".meridian/plugin.ts", "export const p = 1;\n");

    let update = indexer
        .update_index([".meridian/plugin.ts"])
        .expect("update should succeed");

    assert!(update.diagnostics.is_empty());
    let graph = indexer.project_graph();
    assert!(graph.contains(Path::new(".config/a.ts")));
    assert!(!graph.contains(Path::new(".meridian/plugin.ts")));
    assert!(graph.same_contents(&fresh_graph_with(config, dir.path())));
}

/// TypeScript analyzer that rejects any file containing `FAIL`.
struct FlakyAnalyzer(EcmaAnalyzer);

impl Analyzer for FlakyAnalyzer {
    fn language(&self) -> Language {
        self.0.language()
    }

    fn version(&self) -> u32 {
        self.0.version()
    }

    fn analyze(&self, path: &Path, content: &[u8]) -> Result<FileFacts, AnalysisError> {
        if content.windows(4).any(|w| w == b"FAIL") {
            return Err(AnalysisError::Parse("refused by test analyzer".to_string()));
        }
        self.0.analyze(path, content)
    }

    fn import_candidates(&self, from: &Path, import: &ImportSpec) -> Vec<PathBuf> {
        self.0.import_candidates(from, import)
    }
}

#[test]
fn failed_analysis_keeps_previous_record() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.ts", "export function foo() {}\n");
    let mut registry = AnalyzerRegistry::new();
    registry.register(FlakyAnalyzer(EcmaAnalyzer::typescript()));
    let mut indexer = ProjectIndexer::new(test_config(), registry).unwrap();
    indexer.index_project(dir.path()).expect("index failed");

    write_file(dir.path(), "a.ts", "// FAIL\nexport function bar() {}\n");
    let update = indexer.update_index(["a.ts"]).expect("update should succeed");

    assert_eq!(update.files_reindexed, 0);
    assert_eq!(update.diagnostics.len(), 1);
    assert_eq!(update.diagnostics[0].kind, DiagnosticKind::AnalysisFailed);
    assert_eq!(indexer.find_symbol("foo").len(), 1);
    assert!(indexer.find_symbol("bar").is_empty());

    write_file(dir.path(), "a.ts", "export function bar() {}\n");
    indexer.update_index(["a.ts"]).expect("update failed");

    assert!(indexer.find_symbol("foo").is_empty());
    assert_eq!(indexer.find_symbol("bar").len(), 1);
}

#[test]
fn failed_file_still_satisfies_imports() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.ts", "// FAIL\n");
    write_file(dir.path(), "b.ts", "import { a } from './a';\n");
    let mut registry = AnalyzerRegistry::new();
    registry.register(FlakyAnalyzer(EcmaAnalyzer::typescript()));
    let mut indexer = ProjectIndexer::new(test_config(), registry).unwrap();

    let report = indexer.index_project(dir.path()).expect("index failed");

    assert_eq!(report.diagnostics.len(), 1);
    assert!(!report.graph.contains(Path::new("a.ts")));
    assert_eq!(report.graph.dependencies(Path::new("b.ts")), paths(&["a.ts"]));
}

// === Incremental equivalence ===

const SLOTS: usize = 5;
const NAMES: [&str; 3] = ["alpha", "beta", "gamma"];

/// Generated content for one `f{n}.ts` file.
#[derive(Debug, Clone)]
struct SlotContent {
    defines: BTreeSet<usize>,
    imports: BTreeSet<usize>,
    calls: BTreeSet<usize>,
}

impl SlotContent {
    fn render(&self, slot: usize) -> String {
        let mut source = String::new();
        for target in &self.imports {
            source.push_str(&format!("import {{ alpha }} from './f{target}';\n"));
        }
        for name in &self.defines {
            source.push_str(&format!("export function {}{slot}() {{}}\n", NAMES[*name]));
        }
        for name in &self.calls {
            source.push_str(&format!("{}();\n", NAMES[*name]));
        }
        source
    }
}

fn slot_content() -> impl Strategy<Value = Option<SlotContent>> {
    proptest::option::weighted(
        0.8,
        (
            proptest::collection::btree_set(0..NAMES.len(), 0..3),
            proptest::collection::btree_set(0..SLOTS, 0..3),
            proptest::collection::btree_set(0..NAMES.len(), 0..3),
        )
            .prop_map(|(defines, imports, calls)| SlotContent {
                defines,
                imports,
                calls,
            }),
    )
}

fn apply(root: &Path, slot: usize, content: Option<&SlotContent>) {
    let path = root.join(format!("f{slot}.ts"));
    match content {
        Some(content) => fs::write(&path, content.render(slot)).expect("failed to write slot"),
        None => {
            if path.exists() {
                fs::remove_file(&path).expect("failed to remove slot");
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn update_matches_fresh_index(
        initial in proptest::collection::vec(slot_content(), SLOTS),
        edits in proptest::collection::vec((0..SLOTS, slot_content()), 1..4),
    ) {
        let dir = tempfile::tempdir().unwrap();
        for (slot, content) in initial.iter().enumerate() {
            apply(dir.path(), slot, content.as_ref());
        }
        let mut indexer = ProjectIndexer::new(test_config(), AnalyzerRegistry::with_defaults())
            .unwrap();
        indexer.index_project(dir.path()).unwrap();

        let mut changed = BTreeSet::new();
        for (slot, content) in &edits {
            apply(dir.path(), *slot, content.as_ref());
            changed.insert(format!("f{slot}.ts"));
        }
        let update = indexer.update_index(&changed).unwrap();
        prop_assert!(update.diagnostics.is_empty(), "{:?}", update.diagnostics);

        let incremental = indexer.project_graph();
        let fresh = fresh_graph(dir.path());
        prop_assert!(incremental.same_contents(&fresh));
        for name in NAMES {
            prop_assert_eq!(indexer.find_references(name), fresh.find_references(name));
        }
    }
}
