//! Common display utilities for CLI commands.

use std::path::PathBuf;

use colored::Colorize;
use meridian::{Diagnostic, SymbolKind};

const MAX_DISPLAY_ITEMS: usize = 10;
const MAX_DIAGNOSTICS: usize = 5;

/// Display a list of files with optional truncation.
///
/// Shows up to `MAX_DISPLAY_ITEMS` files with bullet points. If there are more,
/// shows "... and N more". If empty, shows the provided `empty_message`.
pub fn print_paths(paths: &[PathBuf], empty_message: &str) {
    if paths.is_empty() {
        println!("    {}", empty_message.dimmed());
        return;
    }

    for path in paths.iter().take(MAX_DISPLAY_ITEMS) {
        println!("    {} {}", "•".dimmed(), path.display());
    }

    if paths.len() > MAX_DISPLAY_ITEMS {
        println!(
            "    {} ... and {} more",
            "•".dimmed(),
            paths.len() - MAX_DISPLAY_ITEMS
        );
    }
}

/// Print the first few per-file diagnostics of a run.
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    println!();
    println!("{} ({}):", "Diagnostics".yellow().bold(), diagnostics.len());
    for diag in diagnostics.iter().take(MAX_DIAGNOSTICS) {
        let bullet = if diag.kind.is_internal_error() {
            "•".red()
        } else {
            "•".yellow()
        };
        println!(
            "  {} {}: {} {}",
            bullet,
            diag.path.display(),
            diag.message,
            format!("({})", diag.kind).dimmed()
        );
    }
    if diagnostics.len() > MAX_DIAGNOSTICS {
        println!("  ... and {} more", diagnostics.len() - MAX_DIAGNOSTICS);
    }
}

/// Human-readable symbol kind.
pub fn format_kind(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::TypeAlias => "type alias",
        other => other.as_str(),
    }
}

#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
