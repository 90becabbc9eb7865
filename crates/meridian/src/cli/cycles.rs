//! `meridian cycles` command implementation.

use std::path::Path;

use colored::Colorize;

/// Run the cycles command.
pub fn run(workspace: &Path, no_cache: bool) -> Result<(), meridian::Error> {
    let (indexer, _) = super::load_project(workspace, no_cache)?;

    let cycles = indexer.project_graph().detect_cycles();

    if cycles.is_empty() {
        println!("{}", "No circular dependencies detected.".green());
        return Ok(());
    }

    println!(
        "Found {} circular dependencies:",
        cycles.len().to_string().red().bold()
    );
    println!();

    for (i, cycle) in cycles.iter().enumerate() {
        println!("  {} {}:", "Cycle".yellow().bold(), i + 1);

        let mut path_str = cycle
            .files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" → ");

        // Close the loop: a → b → a
        if let Some(first) = cycle.files.first() {
            path_str.push_str(" → ");
            path_str.push_str(&first.display().to_string());
        }

        println!("    {}", path_str.dimmed());
    }

    Ok(())
}
