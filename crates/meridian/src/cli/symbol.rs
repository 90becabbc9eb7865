//! `meridian symbol` command implementation.

use std::path::Path;

use colored::Colorize;

use super::display::format_kind;

/// Run the symbol command.
pub fn run(
    workspace: &Path,
    name: &str,
    fuzzy: bool,
    limit: usize,
    no_cache: bool,
) -> Result<(), meridian::Error> {
    let (indexer, report) = super::load_project(workspace, no_cache)?;

    let mut symbols = if fuzzy {
        report.graph.search_symbols(name, limit)
    } else {
        indexer.find_symbol(name)
    };
    symbols.truncate(limit);

    if symbols.is_empty() {
        println!("No symbols found matching \"{name}\"");

        if report.graph.symbol_count() == 0 {
            println!(
                "\n{}: The project has no indexed symbols. Check the workspace path.",
                "hint".dimmed(),
            );
        } else if !fuzzy {
            println!(
                "\n{}: Lookups are exact. Try '{}' for partial matches.",
                "hint".dimmed(),
                format!("meridian symbol --fuzzy {name}").cyan()
            );
        }
        return Ok(());
    }

    println!(
        "Found {} definitions of \"{}\":",
        symbols.len().to_string().green().bold(),
        name.cyan()
    );
    println!();

    for sym in &symbols {
        let location = format!("{}:{}", sym.definition_path.display(), sym.definition_line);
        println!(
            "  {} {} {}",
            sym.name.white().bold(),
            format!("({})", format_kind(sym.kind)).dimmed(),
            format!("- {location}").dimmed()
        );
    }

    Ok(())
}
