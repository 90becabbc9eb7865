//! `meridian stats` command implementation.

use std::collections::BTreeMap;
use std::path::Path;

use colored::Colorize;
use meridian::Language;

use super::display::{format_kind, format_size};

/// Run the stats command.
pub fn run(workspace: &Path, no_cache: bool) -> Result<(), meridian::Error> {
    let (indexer, report) = super::load_project(workspace, no_cache)?;
    let graph = &report.graph;
    let summary = graph.summary();

    println!("{}", "Meridian Project Statistics".cyan().bold());
    println!();

    println!(
        "  {}: {} total ({} services, {} components)",
        "Files".white().bold(),
        summary.files.to_string().green(),
        summary.services,
        summary.components
    );
    let mut by_language: BTreeMap<Language, usize> = BTreeMap::new();
    for record in graph.files() {
        *by_language.entry(record.language).or_default() += 1;
    }
    for (language, count) in by_language {
        println!("    {}: {}", language.as_str().dimmed(), count);
    }
    println!();

    println!(
        "  {}: {} total",
        "Symbols".white().bold(),
        summary.symbols.to_string().green()
    );
    let mut by_kind: BTreeMap<&'static str, usize> = BTreeMap::new();
    for record in graph.files() {
        for id in &record.symbols_defined {
            *by_kind.entry(format_kind(id.kind)).or_default() += 1;
        }
    }
    // Sort by count descending, then by kind for deterministic output
    let mut kind_counts: Vec<_> = by_kind.into_iter().collect();
    kind_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (kind, count) in kind_counts {
        println!("    {}: {}", kind.dimmed(), count);
    }
    println!();

    println!(
        "  {}: {}",
        "References".white().bold(),
        summary.references.to_string().green()
    );
    println!(
        "  {}: {}",
        "File Dependencies".white().bold(),
        summary.dependency_edges.to_string().green()
    );
    println!();

    let cache = indexer.cache_stats();
    let db_path = indexer.config().cache_location(graph.root());
    let db_size = if no_cache {
        "disabled".to_string()
    } else {
        match std::fs::metadata(&db_path) {
            Ok(meta) => format_size(meta.len()),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to get cache file size");
                "size unknown".to_string()
            }
        }
    };
    println!(
        "  {}: {} entries / {} capacity, {} evictions",
        "Cache".white().bold(),
        cache.entries,
        cache.capacity,
        cache.evictions
    );
    println!("    {}: {} ({})", "store".dimmed(), db_path.display(), db_size);

    if let Some(last) = summary.last_indexed {
        println!();
        println!("  {}: {}", "Last indexed".dimmed(), last.to_rfc3339());
    }

    Ok(())
}
