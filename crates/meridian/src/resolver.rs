//! Import specifier → candidate path resolution.
//!
//! Everything here is pure path arithmetic over project-relative paths; no
//! file system access happens. The builder picks the first candidate that is
//! present in the known file set, and the dependency graph watches every
//! candidate so that files appearing later invalidate their importers.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Extensions tried, in order, for extensionless relative ECMAScript imports.
pub const ECMA_EXTENSIONS: &[&str] = &["ts", "tsx", "d.ts", "js", "jsx", "mjs", "cjs"];

/// Lexically normalize a project-relative path.
///
/// Resolves `.` and `..` components. Returns `None` if the path escapes the
/// project root or is absolute.
#[must_use]
pub fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out: Vec<&std::ffi::OsStr> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop()?;
            }
            Component::Normal(name) => out.push(name),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.is_empty() {
        return None;
    }
    Some(out.iter().collect())
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Candidates for a relative ECMAScript import (`./x`, `../y/z`).
///
/// Bare specifiers (packages) and absolute URLs yield no candidates.
#[must_use]
pub fn ecma_candidates(from: &Path, specifier: &str) -> Vec<PathBuf> {
    let is_relative = specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../");
    if !is_relative {
        return Vec::new();
    }

    let dir = from.parent().unwrap_or_else(|| Path::new(""));
    let Some(base) = normalize(&dir.join(specifier)) else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    let explicit_ext = base
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    if let Some(ext) = explicit_ext.as_deref() {
        if ECMA_EXTENSIONS.contains(&ext) {
            candidates.push(base.clone());
        }
        // TypeScript sources import their emitted `.js` names.
        if matches!(ext, "js" | "jsx" | "mjs" | "cjs") {
            candidates.push(base.with_extension("ts"));
            candidates.push(base.with_extension("tsx"));
        }
    }
    for ext in ECMA_EXTENSIONS {
        candidates.push(with_suffix(&base, &format!(".{ext}")));
    }
    for ext in ECMA_EXTENSIONS {
        candidates.push(base.join(format!("index.{ext}")));
    }
    dedup_in_order(candidates)
}

/// Candidates for a Rust module path (`crate::a::b`, `self::x`, `super::y`).
///
/// Longer prefixes come first, since `crate::a::b` may name either module
/// `b` or an item `b` inside module `a`. External crates yield nothing.
#[must_use]
pub fn rust_candidates(from: &Path, specifier: &str) -> Vec<PathBuf> {
    let segments: Vec<&str> = specifier.split("::").filter(|s| !s.is_empty()).collect();
    let Some((first, rest)) = segments.split_first() else {
        return Vec::new();
    };

    let crate_root = crate_root_of(from);
    let (base, rest) = match *first {
        "crate" => (crate_root.clone(), rest),
        "self" | "super" => {
            let mut base = module_dir_of(from);
            let mut rest = rest;
            if *first == "super" {
                base = parent_dir(&base);
            }
            while let Some((&"super", tail)) = rest.split_first() {
                base = parent_dir(&base);
                rest = tail;
            }
            (base, rest)
        }
        _ => return Vec::new(),
    };

    let mut candidates = Vec::new();
    for len in (1..=rest.len()).rev() {
        let dir: PathBuf = rest[..len].iter().fold(base.clone(), |acc, s| acc.join(s));
        candidates.extend(module_files(&dir, &crate_root));
    }
    candidates.extend(module_files(&base, &crate_root));
    dedup_in_order(candidates)
}

/// Files that may hold the module whose directory is `dir`.
fn module_files(dir: &Path, crate_root: &Path) -> Vec<PathBuf> {
    if dir == crate_root {
        return vec![dir.join("lib.rs"), dir.join("main.rs")];
    }
    vec![dir.with_extension("rs"), dir.join("mod.rs")]
}

/// The nearest `src` ancestor of a file, or its directory if there is none.
fn crate_root_of(from: &Path) -> PathBuf {
    from.ancestors()
        .skip(1)
        .find(|dir| dir.file_name().is_some_and(|n| n == "src"))
        .map_or_else(|| parent_dir(from), Path::to_path_buf)
}

/// Directory holding a file's child modules.
fn module_dir_of(from: &Path) -> PathBuf {
    let parent = parent_dir(from);
    match from.file_name().and_then(|n| n.to_str()) {
        Some("mod.rs" | "lib.rs" | "main.rs") | None => parent,
        Some(_) => from
            .file_stem()
            .map_or(parent.clone(), |stem| parent.join(stem)),
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn dedup_in_order(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = std::collections::HashSet::new();
    paths
        .into_iter()
        .filter(|p| !p.as_os_str().is_empty() && seen.insert(p.clone()))
        .collect()
}
