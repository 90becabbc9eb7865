//! `meridian index` command implementation.

use std::path::Path;

use colored::Colorize;

use super::display::print_diagnostics;

/// Run the index command.
pub fn run(workspace: &Path, no_cache: bool) -> Result<(), meridian::Error> {
    println!("{} {}...", "Indexing".cyan().bold(), workspace.display());
    if no_cache {
        println!("{}", "Cache disabled, analyzing every file".yellow());
    }

    let (indexer, report) = super::load_project(workspace, no_cache)?;
    let stats = &report.stats;

    println!();
    println!(
        "{} {} files, found {} symbols, {} references",
        "Indexed".green().bold(),
        stats.files_indexed,
        stats.symbols_found,
        stats.references_found
    );
    println!(
        "{}: {} analyzed, {} from cache",
        "Files".dimmed(),
        stats.files_analyzed,
        stats.cache_hits
    );
    println!("{}: {:.2?}", "Duration".dimmed(), stats.duration);

    if stats.files_removed > 0 {
        println!(
            "{}: {} files no longer on disk",
            "Removed".yellow(),
            stats.files_removed
        );
    }

    if stats.directories_skipped > 0 {
        println!(
            "{}: {} directories (unreadable)",
            "Skipped".yellow(),
            stats.directories_skipped
        );
    }

    if stats.cancelled {
        println!("{}", "Indexing was cancelled before completion".red());
    }

    print_diagnostics(&report.diagnostics);

    let cache = indexer.cache_stats();
    println!();
    println!(
        "{}: {} entries, {:.0}% hit rate",
        "Cache".dimmed(),
        cache.entries,
        cache.hit_rate() * 100.0
    );

    Ok(())
}
